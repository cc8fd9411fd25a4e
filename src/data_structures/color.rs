//! 8-bit RGBA colour used for material tints and draw tints.

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    /// Fully transparent black, the value of unset material map colours.
    pub const BLANK: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert normalised factors (`[0, 1]` per channel) to bytes, rounding.
    ///
    /// Out-of-range factors are clamped.
    pub fn from_factors(factors: [f32; 4]) -> Self {
        Self::new(
            factor_to_u8(factors[0]),
            factor_to_u8(factors[1]),
            factor_to_u8(factors[2]),
            factor_to_u8(factors[3]),
        )
    }

    /// Per-channel multiply, `trunc(a/255 * b/255 * 255)`.
    ///
    /// Evaluated in integers so that white is an exact identity.
    pub fn tinted(self, tint: Color) -> Color {
        let mul = |a: u8, b: u8| (a as u16 * b as u16 / 255) as u8;
        Color::new(
            mul(self.r, tint.r),
            mul(self.g, tint.g),
            mul(self.b, tint.b),
            mul(self.a, tint.a),
        )
    }

    /// Normalised floats, as shaders expect them.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

pub(crate) fn factor_to_u8(factor: f32) -> u8 {
    (factor.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl From<[u8; 4]> for Color {
    fn from(c: [u8; 4]) -> Self {
        Color::new(c[0], c[1], c[2], c[3])
    }
}

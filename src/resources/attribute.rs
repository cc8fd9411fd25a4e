//! Vertex attribute decoding.
//!
//! Accessors describe a strided, typed view into a buffer. Each supported
//! (semantic, component type, shape) combination is decoded into the packed
//! layout [`RenderMesh`](crate::data_structures::mesh::RenderMesh) stores;
//! everything else is reported as [`Unsupported`] and the channel is skipped.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub const fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

impl From<gltf::accessor::DataType> for ComponentType {
    fn from(data_type: gltf::accessor::DataType) -> Self {
        use gltf::accessor::DataType;
        match data_type {
            DataType::I8 => ComponentType::I8,
            DataType::U8 => ComponentType::U8,
            DataType::I16 => ComponentType::I16,
            DataType::U16 => ComponentType::U16,
            DataType::U32 => ComponentType::U32,
            DataType::F32 => ComponentType::F32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl Shape {
    pub const fn components(self) -> usize {
        match self {
            Shape::Scalar => 1,
            Shape::Vec2 => 2,
            Shape::Vec3 => 3,
            Shape::Vec4 | Shape::Mat2 => 4,
            Shape::Mat3 => 9,
            Shape::Mat4 => 16,
        }
    }
}

impl From<gltf::accessor::Dimensions> for Shape {
    fn from(dimensions: gltf::accessor::Dimensions) -> Self {
        use gltf::accessor::Dimensions;
        match dimensions {
            Dimensions::Scalar => Shape::Scalar,
            Dimensions::Vec2 => Shape::Vec2,
            Dimensions::Vec3 => Shape::Vec3,
            Dimensions::Vec4 => Shape::Vec4,
            Dimensions::Mat2 => Shape::Mat2,
            Dimensions::Mat3 => Shape::Mat3,
            Dimensions::Mat4 => Shape::Mat4,
        }
    }
}

/// Where an accessor's elements live inside a resolved buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessorRef {
    pub count: usize,
    pub component: ComponentType,
    pub shape: Shape,
    /// Byte offset of the first element in the buffer.
    pub offset: usize,
    /// Bytes between the starts of two consecutive elements.
    pub stride: usize,
    /// Index of the buffer the accessor reads from.
    pub buffer: usize,
}

impl AccessorRef {
    /// `None` for accessors without a buffer view (sparse-only or zero-filled).
    pub fn from_gltf(accessor: &gltf::Accessor) -> Option<Self> {
        let view = accessor.view()?;
        Some(Self {
            count: accessor.count(),
            component: accessor.data_type().into(),
            shape: accessor.dimensions().into(),
            // an overflowing offset saturates and then fails `end`
            offset: view.offset().saturating_add(accessor.offset()),
            stride: view.stride().unwrap_or_else(|| accessor.size()),
            buffer: view.buffer().index(),
        })
    }

    /// One past the last byte the accessor reads, `None` if that is not
    /// addressable.
    pub fn end(&self) -> Option<usize> {
        let element = self.component.size() * self.shape.components();
        match self.count {
            0 => Some(self.offset),
            n => (n - 1)
                .checked_mul(self.stride)?
                .checked_add(element)?
                .checked_add(self.offset),
        }
    }
}

/// Copy `components` values of type `T` per element out of a strided buffer.
///
/// The buffer holds little-endian data, as glTF mandates.
///
/// # Panics
///
/// If the accessor reaches past the end of `buffer`; check
/// [`AccessorRef::end`] against the buffer length first.
pub fn load_attribute<T: bytemuck::Pod>(
    accessor: &AccessorRef,
    components: usize,
    buffer: &[u8],
) -> Vec<T> {
    let size = std::mem::size_of::<T>();
    let mut out = Vec::with_capacity(accessor.count * components);
    for element in 0..accessor.count {
        let start = accessor.offset + element * accessor.stride;
        for component in 0..components {
            let at = start + component * size;
            out.push(bytemuck::pod_read_unaligned(&buffer[at..at + size]));
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    TexCoord0,
    Color0,
    Indices,
}

impl Semantic {
    /// The format this crate accepts for the semantic, for diagnostics.
    fn expected(self) -> &'static str {
        match self {
            Semantic::Position | Semantic::Normal => "vec3 float",
            Semantic::Tangent => "vec4 float",
            Semantic::TexCoord0 => "vec2 float",
            Semantic::Color0 => "vec4 u8, u16 or float",
            Semantic::Indices => "scalar u16 or u32",
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Semantic::Position => "Vertices position",
            Semantic::Normal => "Normal",
            Semantic::Tangent => "Tangent",
            Semantic::TexCoord0 => "Texcoords",
            Semantic::Color0 => "Color",
            Semantic::Indices => "Indices",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeData {
    Positions(Vec<f32>),
    Normals(Vec<f32>),
    Tangents(Vec<f32>),
    TexCoords(Vec<f32>),
    Colors(Vec<u8>),
    Indices {
        indices: Vec<u16>,
        /// Number of 32-bit indices that did not fit and wrapped around.
        wrapped: Option<usize>,
    },
}

/// A (semantic, component type, shape) combination with no decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unsupported {
    pub semantic: Semantic,
    pub component: ComponentType,
    pub shape: Shape,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attribute data format {:?} {:?} not supported, use {}",
            self.semantic,
            self.shape,
            self.component,
            self.semantic.expected()
        )
    }
}

impl std::error::Error for Unsupported {}

/// Decode one accessor for `semantic`.
pub fn negotiate(
    semantic: Semantic,
    accessor: &AccessorRef,
    buffer: &[u8],
) -> Result<AttributeData, Unsupported> {
    use ComponentType as C;
    use Shape as S;

    let data = match (semantic, accessor.component, accessor.shape) {
        (Semantic::Position, C::F32, S::Vec3) => {
            AttributeData::Positions(load_attribute(accessor, 3, buffer))
        }
        (Semantic::Normal, C::F32, S::Vec3) => {
            AttributeData::Normals(load_attribute(accessor, 3, buffer))
        }
        (Semantic::Tangent, C::F32, S::Vec4) => {
            AttributeData::Tangents(load_attribute(accessor, 4, buffer))
        }
        (Semantic::TexCoord0, C::F32, S::Vec2) => {
            AttributeData::TexCoords(load_attribute(accessor, 2, buffer))
        }
        (Semantic::Color0, C::U8, S::Vec4) => {
            AttributeData::Colors(load_attribute(accessor, 4, buffer))
        }
        (Semantic::Color0, C::U16, S::Vec4) => AttributeData::Colors(
            load_attribute::<u16>(accessor, 4, buffer)
                .into_iter()
                .map(|v| (v as f32 / 65535.0 * 255.0).round() as u8)
                .collect(),
        ),
        (Semantic::Color0, C::F32, S::Vec4) => AttributeData::Colors(
            load_attribute::<f32>(accessor, 4, buffer)
                .into_iter()
                .map(crate::data_structures::color::factor_to_u8)
                .collect(),
        ),
        (Semantic::Indices, C::U16, S::Scalar) => AttributeData::Indices {
            indices: load_attribute(accessor, 1, buffer),
            wrapped: None,
        },
        (Semantic::Indices, C::U32, S::Scalar) => {
            let wide = load_attribute::<u32>(accessor, 1, buffer);
            let wrapped = wide.iter().filter(|&&i| i > u16::MAX as u32).count();
            AttributeData::Indices {
                indices: wide.into_iter().map(|i| i as u16).collect(),
                wrapped: Some(wrapped),
            }
        }
        (semantic, component, shape) => {
            return Err(Unsupported {
                semantic,
                component,
                shape,
            });
        }
    };
    Ok(data)
}

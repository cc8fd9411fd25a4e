//! Render materials: a fixed set of texture-map slots.
//!
//! Materials are generic over the texture handle so the same type describes
//! decoded CPU images (`RenderMaterial<image::RgbaImage>`) while loading and
//! backend textures once uploaded.

use std::ops::{Index, IndexMut};

use crate::data_structures::color::Color;

/// The map slots a material carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialMapKind {
    /// Base colour. Draw tints are applied to this slot's colour.
    Albedo,
    Metalness,
    Normal,
    /// Holds the combined metallic-roughness texture of glTF.
    Roughness,
    Occlusion,
    Emission,
}

impl MaterialMapKind {
    pub const ALL: [MaterialMapKind; 6] = [
        MaterialMapKind::Albedo,
        MaterialMapKind::Metalness,
        MaterialMapKind::Normal,
        MaterialMapKind::Roughness,
        MaterialMapKind::Occlusion,
        MaterialMapKind::Emission,
    ];

    const fn slot(self) -> usize {
        match self {
            MaterialMapKind::Albedo => 0,
            MaterialMapKind::Metalness => 1,
            MaterialMapKind::Normal => 2,
            MaterialMapKind::Roughness => 3,
            MaterialMapKind::Occlusion => 4,
            MaterialMapKind::Emission => 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialMap<T> {
    pub texture: Option<T>,
    pub color: Color,
    pub value: f32,
}

impl<T> Default for MaterialMap<T> {
    fn default() -> Self {
        Self {
            texture: None,
            color: Color::BLANK,
            value: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderMaterial<T> {
    pub name: Option<String>,
    pub maps: [MaterialMap<T>; 6],
}

impl<T> RenderMaterial<T> {
    /// Untextured white material. Index 0 of every model's material array.
    pub fn new_default() -> Self {
        let mut material = Self {
            name: None,
            maps: Default::default(),
        };
        material[MaterialMapKind::Albedo].color = Color::WHITE;
        material[MaterialMapKind::Metalness].color = Color::WHITE;
        material
    }

    pub fn texture(&self, kind: MaterialMapKind) -> Option<&T> {
        self[kind].texture.as_ref()
    }

    /// Convert every texture while keeping colours and values.
    ///
    /// Slots whose conversion fails end up untextured; the error is handed to
    /// `on_error` together with the slot.
    pub fn try_map_textures<U>(
        self,
        mut convert: impl FnMut(MaterialMapKind, T) -> anyhow::Result<U>,
        mut on_error: impl FnMut(MaterialMapKind, anyhow::Error),
    ) -> RenderMaterial<U> {
        let mut maps = self.maps.into_iter();
        let maps = MaterialMapKind::ALL.map(|kind| {
            let map = maps.next().unwrap_or_default();
            let texture = map.texture.and_then(|texture| match convert(kind, texture) {
                Ok(texture) => Some(texture),
                Err(e) => {
                    on_error(kind, e);
                    None
                }
            });
            MaterialMap {
                texture,
                color: map.color,
                value: map.value,
            }
        });
        RenderMaterial {
            name: self.name,
            maps,
        }
    }
}

impl<T: Clone> RenderMaterial<T> {
    /// Copy of this material with the albedo colour multiplied by `tint`.
    pub fn tinted(&self, tint: Color) -> Self {
        let mut material = self.clone();
        let albedo = &mut material[MaterialMapKind::Albedo];
        albedo.color = albedo.color.tinted(tint);
        material
    }
}

impl<T> Default for RenderMaterial<T> {
    fn default() -> Self {
        Self::new_default()
    }
}

impl<T> Index<MaterialMapKind> for RenderMaterial<T> {
    type Output = MaterialMap<T>;

    fn index(&self, kind: MaterialMapKind) -> &Self::Output {
        &self.maps[kind.slot()]
    }
}

impl<T> IndexMut<MaterialMapKind> for RenderMaterial<T> {
    fn index_mut(&mut self, kind: MaterialMapKind) -> &mut Self::Output {
        &mut self.maps[kind.slot()]
    }
}

//! Ship asset seam
//!
//! The ship is the only textured model. Its geometry and two textures come
//! from a [`ShipSource`]; whatever the source produces is validated before
//! anything touches the GPU.

use thiserror::Error;

use super::shapes::{MeshData, ship_hull};

/// Problems with a ship asset. Always fatal to renderer startup.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("ship mesh has no triangles")]
    EmptyGeometry,
    #[error("ship index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
    #[error("ship index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u16, vertex_count: usize },
    #[error("{name} texture has a zero dimension ({width}x{height})")]
    ZeroTextureDimension {
        name: &'static str,
        width: u32,
        height: u32,
    },
    #[error("{name} texture holds {actual} bytes, expected {expected}")]
    TextureSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("ship source failed: {0}")]
    Source(String),
}

/// Tightly packed RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    fn validate(&self, name: &'static str) -> Result<(), AssetError> {
        if self.width == 0 || self.height == 0 {
            return Err(AssetError::ZeroTextureDimension {
                name,
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width as usize * self.height as usize * 4;
        if self.rgba.len() != expected {
            return Err(AssetError::TextureSize {
                name,
                expected,
                actual: self.rgba.len(),
            });
        }
        Ok(())
    }
}

/// Geometry plus material for the player ship
#[derive(Debug, Clone, PartialEq)]
pub struct ShipAsset {
    pub mesh: MeshData,
    pub base_color: TextureData,
    /// glTF layout: roughness in G, metallic in B
    pub metallic_roughness: TextureData,
}

impl ShipAsset {
    pub fn validate(&self) -> Result<(), AssetError> {
        let indices = &self.mesh.indices;
        if indices.is_empty() || self.mesh.vertices.is_empty() {
            return Err(AssetError::EmptyGeometry);
        }
        if indices.len() % 3 != 0 {
            return Err(AssetError::PartialTriangle(indices.len()));
        }
        let vertex_count = self.mesh.vertices.len();
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(AssetError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        self.base_color.validate("base color")?;
        self.metallic_roughness.validate("metallic-roughness")?;
        Ok(())
    }
}

/// Anything that can produce the ship asset
pub trait ShipSource {
    fn load(&self) -> Result<ShipAsset, AssetError>;
}

/// Load from `source` and validate, logging failures
pub fn load_ship(source: &dyn ShipSource) -> Result<ShipAsset, AssetError> {
    let asset = source.load().and_then(|asset| {
        asset.validate()?;
        Ok(asset)
    });
    match &asset {
        Ok(a) => log::info!(
            "Ship asset loaded: {} vertices, {} indices, {}x{} textures",
            a.mesh.vertices.len(),
            a.mesh.indices.len(),
            a.base_color.width,
            a.base_color.height
        ),
        Err(e) => log::error!("Ship asset rejected: {e}"),
    }
    asset
}

/// Built-in hull with generated panel textures
#[derive(Debug, Clone, Copy)]
pub struct ProceduralShip {
    pub texture_size: u32,
}

impl Default for ProceduralShip {
    fn default() -> Self {
        Self { texture_size: 64 }
    }
}

impl ProceduralShip {
    /// Hull plating with darker panel seams and a warm stripe down the spine
    fn base_color(&self) -> TextureData {
        let n = self.texture_size;
        let mut rgba = Vec::with_capacity((n * n * 4) as usize);
        for y in 0..n {
            for x in 0..n {
                let seam = x % 16 == 0 || y % 16 == 0;
                let spine = (x as i64 - n as i64 / 2).abs() < (n as i64 / 16).max(1);
                let texel: [u8; 4] = if spine {
                    [230, 120, 40, 255]
                } else if seam {
                    [90, 100, 120, 255]
                } else {
                    [200, 210, 230, 255]
                };
                rgba.extend_from_slice(&texel);
            }
        }
        TextureData {
            width: n,
            height: n,
            rgba,
        }
    }

    /// Metallic plates, rough seams
    fn metallic_roughness(&self) -> TextureData {
        let n = self.texture_size;
        let mut rgba = Vec::with_capacity((n * n * 4) as usize);
        for y in 0..n {
            for x in 0..n {
                let seam = x % 16 == 0 || y % 16 == 0;
                let (roughness, metallic) = if seam { (230, 40) } else { (90, 220) };
                rgba.extend_from_slice(&[0, roughness, metallic, 255]);
            }
        }
        TextureData {
            width: n,
            height: n,
            rgba,
        }
    }
}

impl ShipSource for ProceduralShip {
    fn load(&self) -> Result<ShipAsset, AssetError> {
        if self.texture_size == 0 {
            return Err(AssetError::Source("texture size must be non-zero".into()));
        }
        Ok(ShipAsset {
            mesh: ship_hull(),
            base_color: self.base_color(),
            metallic_roughness: self.metallic_roughness(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> ShipAsset {
        ProceduralShip::default().load().unwrap()
    }

    #[test]
    fn test_procedural_ship_is_valid() {
        let ship = load_ship(&ProceduralShip::default()).unwrap();
        assert_eq!(ship.base_color.rgba.len(), 64 * 64 * 4);
        assert_eq!(ship.metallic_roughness.width, 64);
    }

    #[test]
    fn test_rejects_empty_geometry() {
        let mut ship = asset();
        ship.mesh.indices.clear();
        assert!(matches!(ship.validate(), Err(AssetError::EmptyGeometry)));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let mut ship = asset();
        let count = ship.mesh.vertices.len();
        ship.mesh.indices[4] = count as u16;
        assert!(matches!(
            ship.validate(),
            Err(AssetError::IndexOutOfRange { vertex_count, .. }) if vertex_count == count
        ));
    }

    #[test]
    fn test_rejects_partial_triangle() {
        let mut ship = asset();
        ship.mesh.indices.push(0);
        assert!(matches!(ship.validate(), Err(AssetError::PartialTriangle(_))));
    }

    #[test]
    fn test_rejects_short_texture() {
        let mut ship = asset();
        ship.metallic_roughness.rgba.truncate(10);
        assert!(matches!(
            ship.validate(),
            Err(AssetError::TextureSize { name: "metallic-roughness", actual: 10, .. })
        ));
    }

    #[test]
    fn test_rejects_zero_sized_texture() {
        let mut ship = asset();
        ship.base_color = TextureData {
            width: 0,
            height: 4,
            rgba: Vec::new(),
        };
        assert!(matches!(
            ship.validate(),
            Err(AssetError::ZeroTextureDimension { .. })
        ));
    }

    #[test]
    fn test_failing_source_surfaces_error() {
        let source = ProceduralShip { texture_size: 0 };
        assert!(matches!(load_ship(&source), Err(AssetError::Source(_))));
    }
}

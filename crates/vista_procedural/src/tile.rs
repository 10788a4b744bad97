//! # Tile Model
//!
//! A tile is one column of terrain: what it is, how it behaves, how tall it
//! is and how much sun reaches it.
//!
//! Colors are packed RGBA (`r | g << 8 | b << 16 | a << 24`), which is the
//! byte order a canvas-style surface expects on little-endian hosts.

use serde::{Deserialize, Serialize};

/// Packs four channels into one RGBA word.
#[inline]
#[must_use]
pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

/// Splits an RGBA word into `[r, g, b, a]`.
#[inline]
#[must_use]
pub const fn unpack(color: u32) -> [u8; 4] {
    [
        (color & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        ((color >> 16) & 0xff) as u8,
        (color >> 24) as u8,
    ]
}

/// Climate region a tile belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Biome {
    /// Temperate land and water.
    #[default]
    Normal = 0,
    /// Frozen.
    Ice = 1,
    /// Dry sand.
    Desert = 2,
    /// Volcanic.
    Hell = 3,
}

/// Physical behavior of a tile surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Behavior {
    /// Walkable ground.
    #[default]
    Solid = 0,
    /// Opaque liquid (lava).
    Liquid = 1,
    /// Liquid that mirrors the sky (water).
    ReflectiveLiquid = 2,
}

/// Surface material of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileType {
    /// Grassland.
    Grass = 0,
    /// Open water.
    Water = 1,
    /// Shore sand.
    Sand = 2,
    /// Arid desert sand.
    DesertSand = 3,
    /// Bare dirt.
    Dirt = 4,
    /// High rock.
    Stone = 5,
    /// Frozen water.
    Ice = 6,
    /// Snow cover.
    Snow = 7,
    /// Molten rock.
    Lava = 8,
    /// Cooled volcanic rock.
    VolcanicRock = 9,
}

impl TileType {
    /// Every tile type, in discriminant order.
    pub const ALL: [Self; 10] = [
        Self::Grass,
        Self::Water,
        Self::Sand,
        Self::DesertSand,
        Self::Dirt,
        Self::Stone,
        Self::Ice,
        Self::Snow,
        Self::Lava,
        Self::VolcanicRock,
    ];

    /// Indexed by discriminant.
    const COLORS: [u32; 10] = [
        rgba(0x98, 0xdd, 0x00, 0xff),
        rgba(0x00, 0xdd, 0xca, 0xff),
        rgba(0xc2, 0xb2, 0x80, 0xff),
        rgba(0xf4, 0xa4, 0x60, 0xff),
        rgba(0xbb, 0x8b, 0x00, 0xff),
        rgba(0x8d, 0x8d, 0x8d, 0xff),
        rgba(0xb9, 0xe8, 0xea, 0xff),
        rgba(0xff, 0xfa, 0xfa, 0xff),
        rgba(0xcf, 0x10, 0x20, 0xff),
        rgba(0x3d, 0x3f, 0x3e, 0xff),
    ];

    /// Returns the flat color of this tile type.
    #[inline]
    #[must_use]
    pub const fn color(self) -> u32 {
        Self::COLORS[self as usize]
    }
}

/// Returns the flat color of a tile type.
#[inline]
#[must_use]
pub const fn color_of(tile_type: TileType) -> u32 {
    tile_type.color()
}

/// One classified terrain column.
///
/// Produced only by the terrain classifier, immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    /// Climate region.
    pub biome: Biome,
    /// Surface behavior.
    pub behavior: Behavior,
    /// Surface material.
    pub tile_type: TileType,
    /// Packed RGBA, always `color_of(tile_type)`.
    pub color: u32,
    /// Surface height in world units.
    pub height: i32,
    /// Brightness in `[baseline, sunlight]`.
    pub light: f64,
}

impl Tile {
    /// Placeholder used to size chunk storage before generation fills it.
    pub(crate) const EMPTY: Self = Self {
        biome: Biome::Normal,
        behavior: Behavior::Solid,
        tile_type: TileType::Water,
        color: TileType::Water.color(),
        height: 0,
        light: 0.0,
    };

    /// Returns true for water and lava.
    #[inline]
    #[must_use]
    pub const fn is_liquid(&self) -> bool {
        !matches!(self.behavior, Behavior::Solid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_packing() {
        assert_eq!(rgba(0x11, 0x22, 0x33, 0x44), 0x4433_2211);
        assert_eq!(unpack(0x4433_2211), [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_color_table_is_total_and_stable() {
        for tile_type in TileType::ALL {
            let first = color_of(tile_type);
            assert_eq!(first, color_of(tile_type));
            assert_eq!(unpack(first)[3], 0xff, "{tile_type:?} must be opaque");
        }
    }

    #[test]
    fn test_color_table_values() {
        assert_eq!(color_of(TileType::Grass), rgba(0x98, 0xdd, 0x00, 0xff));
        assert_eq!(color_of(TileType::Lava), rgba(0xcf, 0x10, 0x20, 0xff));
        assert_eq!(color_of(TileType::VolcanicRock), rgba(0x3d, 0x3f, 0x3e, 0xff));
    }

    #[test]
    fn test_colors_are_distinct() {
        let mut colors: Vec<u32> = TileType::ALL.iter().map(|t| t.color()).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), TileType::ALL.len());
    }

    #[test]
    fn test_all_is_in_discriminant_order() {
        for (i, tile_type) in TileType::ALL.iter().enumerate() {
            assert_eq!(*tile_type as usize, i);
        }
    }
}

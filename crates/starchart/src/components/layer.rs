use serde::Serialize;

/// Map layer: controls draw order of scene shapes.
///
/// Layers are drawn back-to-front: Background first, Labels last.
/// Each layer is rebuilt and toggled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MapLayer {
    Background = 0,
    Belts = 1,
    Orbits = 2,
    Links = 3,
    Wormholes = 4,
    JumpRadius = 5,
    Bodies = 6,
    Markers = 7,
    Labels = 8,
}

impl MapLayer {
    /// Total number of map layers.
    pub const COUNT: usize = 9;

    /// All layers in draw order.
    pub const ALL: [MapLayer; Self::COUNT] = [
        Self::Background,
        Self::Belts,
        Self::Orbits,
        Self::Links,
        Self::Wormholes,
        Self::JumpRadius,
        Self::Bodies,
        Self::Markers,
        Self::Labels,
    ];

    /// Convert from a u8 value to a MapLayer.
    /// Returns None if the value is out of range.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Bit for this layer in a layer mask.
    pub fn bit(self) -> u16 {
        1 << self.as_u8()
    }
}

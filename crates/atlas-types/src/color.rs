use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A 24-bit RGB color packed as `(r << 16) | (g << 8) | b`.
///
/// This is the representation used by the color table, the material
/// template, and the `update_material` command.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedColor(u32);

impl PackedColor {
    pub const WHITE: Self = Self(0xFF_FF_FF);
    pub const BLACK: Self = Self(0x00_00_00);

    /// Wrap a packed value, rejecting anything above `0xFFFFFF`.
    pub fn new(value: u32) -> Result<Self, TypeError> {
        if value > 0xFF_FF_FF {
            return Err(TypeError::ColorOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Wrap a packed value, discarding bits above the low 24.
    pub const fn from_masked(value: u32) -> Self {
        Self(value & 0xFF_FF_FF)
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Pack normalized channels.
    ///
    /// Each channel is scaled by 255, rounded to the nearest integer, and
    /// masked into a byte. Values outside `[0, 1]` wrap rather than saturate.
    pub fn from_unit_channels(r: f64, g: f64, b: f64) -> Self {
        let byte = |c: f64| ((c * 255.0).round() as i64 & 0xFF) as u32;
        Self((byte(r) << 16) | (byte(g) << 8) | byte(b))
    }

    /// Parse `#rrggbb`, `0xrrggbb`, or bare `rrggbb`.
    pub fn parse_hex(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 6 {
            return Err(TypeError::InvalidColor(s.to_string()));
        }
        let value =
            u32::from_str_radix(digits, 16).map_err(|_| TypeError::InvalidColor(s.to_string()))?;
        Ok(Self(value))
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    pub const fn r(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(&self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Debug for PackedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedColor(#{:06x})", self.0)
    }
}

impl fmt::Display for PackedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl From<PackedColor> for u32 {
    fn from(color: PackedColor) -> Self {
        color.0
    }
}

// Texel formats understood by the GPU.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GL pixel format and type tokens accepted for texture data.
pub mod tokens {
    pub const ALPHA: u32 = 0x1906;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const LUMINANCE: u32 = 0x1909;
    pub const LUMINANCE_ALPHA: u32 = 0x190A;

    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const UNSIGNED_SHORT_4_4_4_4: u32 = 0x8033;
    pub const UNSIGNED_SHORT_5_5_5_1: u32 = 0x8034;
    pub const UNSIGNED_SHORT_5_6_5: u32 = 0x8363;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexelFormat {
    Rgba8,    // 32-bit RGBA
    Rgb8,     // 24-bit RGB
    Rgba5551, // 16-bit RGB + 1-bit alpha
    Rgb565,   // 16-bit RGB
    Rgba4,    // 16-bit RGBA, 4 bits per channel
    La8,      // 8-bit luminance + alpha
    L8,       // 8-bit luminance
    A8,       // 8-bit alpha
}

impl TexelFormat {
    pub const ALL: [TexelFormat; 8] = [
        TexelFormat::Rgba8,
        TexelFormat::Rgb8,
        TexelFormat::Rgba5551,
        TexelFormat::Rgb565,
        TexelFormat::Rgba4,
        TexelFormat::La8,
        TexelFormat::L8,
        TexelFormat::A8,
    ];

    /// Resolve a GL `(format, type)` pair.
    pub fn from_gl(format: u32, pixel_type: u32) -> Option<Self> {
        use tokens::*;
        match (format, pixel_type) {
            (RGBA, UNSIGNED_BYTE) => Some(Self::Rgba8),
            (RGB, UNSIGNED_BYTE) => Some(Self::Rgb8),
            (RGBA, UNSIGNED_SHORT_5_5_5_1) => Some(Self::Rgba5551),
            (RGB, UNSIGNED_SHORT_5_6_5) => Some(Self::Rgb565),
            (RGBA, UNSIGNED_SHORT_4_4_4_4) => Some(Self::Rgba4),
            (LUMINANCE_ALPHA, UNSIGNED_BYTE) => Some(Self::La8),
            (LUMINANCE, UNSIGNED_BYTE) => Some(Self::L8),
            (ALPHA, UNSIGNED_BYTE) => Some(Self::A8),
            _ => None,
        }
    }

    /// The GL `(format, type)` pair for this texel format.
    pub fn to_gl(self) -> (u32, u32) {
        use tokens::*;
        match self {
            Self::Rgba8 => (RGBA, UNSIGNED_BYTE),
            Self::Rgb8 => (RGB, UNSIGNED_BYTE),
            Self::Rgba5551 => (RGBA, UNSIGNED_SHORT_5_5_5_1),
            Self::Rgb565 => (RGB, UNSIGNED_SHORT_5_6_5),
            Self::Rgba4 => (RGBA, UNSIGNED_SHORT_4_4_4_4),
            Self::La8 => (LUMINANCE_ALPHA, UNSIGNED_BYTE),
            Self::L8 => (LUMINANCE, UNSIGNED_BYTE),
            Self::A8 => (ALPHA, UNSIGNED_BYTE),
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
            Self::Rgba5551 | Self::Rgb565 | Self::Rgba4 | Self::La8 => 2,
            Self::L8 | Self::A8 => 1,
        }
    }

    /// Whether the display-transfer engine can convert this format itself.
    pub const fn hardware_transfer(self) -> bool {
        matches!(
            self,
            Self::Rgba8 | Self::Rgb8 | Self::Rgba5551 | Self::Rgb565 | Self::Rgba4
        )
    }

    pub fn surface_size(self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rgba8 => "rgba8",
            Self::Rgb8 => "rgb8",
            Self::Rgba5551 => "rgba5551",
            Self::Rgb565 => "rgb565",
            Self::Rgba4 => "rgba4",
            Self::La8 => "la8",
            Self::L8 => "l8",
            Self::A8 => "a8",
        }
    }
}

impl fmt::Display for TexelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TexelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| format!("unknown texel format '{}'", s))
    }
}

#![forbid(unsafe_code)]

//! Event palette.

use std::fmt;

/// An sRGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Render as a lowercase `#rrggbb` string.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Border (`primary`) and fill (`secondary`) colors of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskColor {
    pub primary: Rgb,
    pub secondary: Rgb,
}

impl TaskColor {
    /// Default color for tasks without a participant conflict.
    pub const NEUTRAL: Self = Self {
        primary: Rgb(0x1e, 0x90, 0xff),
        secondary: Rgb(0xd1, 0xe8, 0xff),
    };

    /// Color for tasks whose participants are double-booked.
    pub const WARNING: Self = Self {
        primary: Rgb(0xad, 0x21, 0x21),
        secondary: Rgb(0xfa, 0xe3, 0xe3),
    };

    /// Whether this is the conflict color.
    #[inline]
    #[must_use]
    pub fn is_warning(self) -> bool {
        self == Self::WARNING
    }
}

impl Default for TaskColor {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

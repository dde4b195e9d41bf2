//! Cell colors.
//!
//! A color is written `#rrggbb`. Hex digits are accepted in either case and the
//! accepted text is kept verbatim, so an artifact that is loaded and saved again
//! comes back byte-for-byte. Two colors compare equal when they decode to the
//! same RGB triple.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Marker that starts every color string.
pub const COLOR_MARKER: char = '#';

#[derive(Debug, Clone)]
pub struct Color {
    text: String,
    rgb: [u8; 3],
}

impl Color {
    /// Parse `#rrggbb`. Anything else is an [`Error::InvalidColorFormat`].
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidColorFormat(text.to_string());

        let digits = text.strip_prefix(COLOR_MARKER).ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            text: text.to_string(),
            rgb: [channel(0)?, channel(2)?, channel(4)?],
        })
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            text: format!("#{r:02x}{g:02x}{b:02x}"),
            rgb: [r, g, b],
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    /// Fully opaque RGBA form, as painted onto the canvas.
    pub fn rgba(&self) -> [u8; 4] {
        let [r, g, b] = self.rgb;
        [r, g, b, 255]
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.rgb == other.rgb
    }
}

impl Eq for Color {}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Color::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_decodes_channels() {
        let c = Color::parse("#ff8000").unwrap();
        assert_eq!(c.rgb(), [255, 128, 0]);
        assert_eq!(c.rgba(), [255, 128, 0, 255]);
        assert_eq!(c.to_string(), "#ff8000");
    }

    #[test]
    fn preserves_case_but_compares_by_value() {
        let upper = Color::parse("#FF0000").unwrap();
        let lower = Color::parse("#ff0000").unwrap();
        assert_eq!(upper.as_str(), "#FF0000");
        assert_eq!(upper, lower);
    }

    #[test]
    fn rejects_bad_formats() {
        for bad in ["red", "#fff", "#gggggg", "ff0000", "#ff00000", "#ff 000", "", "#"] {
            match Color::parse(bad) {
                Err(Error::InvalidColorFormat(s)) => assert_eq!(s, bad),
                other => panic!("expected InvalidColorFormat for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        assert!(Color::parse("#ééé").is_err());
    }

    #[test]
    fn from_rgb_writes_lowercase() {
        assert_eq!(Color::from_rgb(0, 255, 16).as_str(), "#00ff10");
    }
}

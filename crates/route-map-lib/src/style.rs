//! Line styles, colors and the activity classification

use crate::{Result, RouteMapError};
use std::fmt;
use std::str::FromStr;

/// An RGB color stored in `RRGGBB` order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB` with an optional leading `#`
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let [r, g, b] = parse_bytes::<3>(hex).ok_or_else(|| RouteMapError::InvalidColor(s.to_string()))?;
        Ok(Self { r, g, b })
    }

    /// `RRGGBB`, uppercase, without `#`
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Byte-swapped `BBGGRR` as used by the track-file format
    pub fn to_bgr_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.b, self.g, self.r)
    }

    /// Opaque track-file color, `ffBBGGRR`
    pub fn to_track_color(&self) -> String {
        format!("ff{}", self.to_bgr_hex())
    }
}

fn parse_bytes<const N: usize>(hex: &str) -> Option<[u8; N]> {
    if hex.len() != N * 2 || !hex.is_ascii() {
        return None;
    }
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = RouteMapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Visual style of a route's line
///
/// The width is stored as given. The minimum render width is applied when
/// an element is drawn, see [`Style::render_width`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    pub color: Rgb,
    pub width: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            width: 2.0,
        }
    }
}

impl Style {
    pub fn new(color: Rgb, width: f64) -> Self {
        Self { color, width }
    }

    /// Width used for drawing, never below `min_width`
    #[inline]
    pub fn render_width(&self, min_width: f64) -> f64 {
        self.width.max(min_width)
    }
}

/// The closed set of activity classifications
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Activity {
    Trail,
    Road,
    #[cfg_attr(feature = "serde", serde(rename = "offtrail"))]
    OffTrail,
    Bush,
    Paddle,
    Crossing,
    Float,
    Rapid,
}

impl Activity {
    pub const ALL: [Activity; 8] = [
        Activity::Trail,
        Activity::Road,
        Activity::OffTrail,
        Activity::Bush,
        Activity::Paddle,
        Activity::Crossing,
        Activity::Float,
        Activity::Rapid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Trail => "trail",
            Activity::Road => "road",
            Activity::OffTrail => "offtrail",
            Activity::Bush => "bush",
            Activity::Paddle => "paddle",
            Activity::Crossing => "crossing",
            Activity::Float => "float",
            Activity::Rapid => "rapid",
        }
    }

    /// Fixed render color of the activity
    pub fn color(&self) -> Rgb {
        match self {
            Activity::Trail => Rgb::new(0xFF, 0xC9, 0x00),
            Activity::Road => Rgb::new(0x6E, 0x72, 0x71),
            Activity::OffTrail => Rgb::new(0xFF, 0x62, 0x00),
            Activity::Bush => Rgb::new(0x7A, 0xD9, 0x15),
            Activity::Paddle => Rgb::new(0x04, 0x79, 0xFF),
            Activity::Crossing => Rgb::new(0x57, 0x26, 0xC2),
            Activity::Float => Rgb::new(0x00, 0xDA, 0xE1),
            Activity::Rapid => Rgb::new(0xF4, 0x24, 0x10),
        }
    }

    /// Reverse lookup of the color table
    pub fn from_color(color: Rgb) -> Option<Activity> {
        Self::ALL.into_iter().find(|a| a.color() == color)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = RouteMapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| RouteMapError::InvalidActivity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_color_table() {
        let expected = [
            ("trail", "#FFC900"),
            ("road", "#6E7271"),
            ("offtrail", "#FF6200"),
            ("bush", "#7AD915"),
            ("paddle", "#0479FF"),
            ("crossing", "#5726C2"),
            ("float", "#00DAE1"),
            ("rapid", "#F42410"),
        ];
        for (name, color) in expected {
            let activity: Activity = name.parse().unwrap();
            assert_eq!(activity.color().to_string(), color);
            assert_eq!(activity.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_activity_rejected() {
        assert!(matches!(
            "unknown".parse::<Activity>(),
            Err(RouteMapError::InvalidActivity(s)) if s == "unknown"
        ));
        assert!("".parse::<Activity>().is_err());
        assert!("Trail".parse::<Activity>().is_err());
    }

    #[test]
    fn test_activity_from_color() {
        assert_eq!(Activity::from_color(Rgb::new(0xFF, 0xC9, 0x00)), Some(Activity::Trail));
        assert_eq!(Activity::from_color(Rgb::WHITE), None);
    }

    #[test]
    fn test_rgb_hex() {
        let c = Rgb::from_hex("#12aB34").unwrap();
        assert_eq!(c, Rgb::new(0x12, 0xAB, 0x34));
        assert_eq!(c.to_hex(), "12AB34");
        assert_eq!(Rgb::from_hex("FFC900").unwrap().to_string(), "#FFC900");
        assert!(Rgb::from_hex("12345").is_err());
        assert!(Rgb::from_hex("zz0000").is_err());
    }

    #[test]
    fn test_track_color_byte_swap() {
        let c = Rgb::new(0x11, 0x22, 0x33);
        assert_eq!(c.to_bgr_hex(), "332211");
        assert_eq!(c.to_track_color(), "ff332211");
    }

    #[test]
    fn test_render_width_floor() {
        let thin = Style::new(Rgb::WHITE, 1.0);
        assert_eq!(thin.render_width(3.0), 3.0);
        assert_eq!(thin.width, 1.0);
        let wide = Style::new(Rgb::WHITE, 12.0);
        assert_eq!(wide.render_width(3.0), 12.0);
    }
}

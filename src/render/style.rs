use crate::core::constants::{
    CLUSTER_MAX_RADIUS_PX, CLUSTER_MIN_RADIUS_PX, CLUSTER_SATURATION_COUNT,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[cfg(feature = "egui")]
use egui::Color32;

/// An sRGB colour. Serialized as a `#rrggbb` / `#rrggbbaa` hex string so
/// palettes stay readable in JSON configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || Error::InvalidConfig(format!("invalid colour {hex:?}"));

        let channel = |range: std::ops::Range<usize>| -> Result<u8> {
            digits
                .get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(invalid)
        };

        match digits.len() {
            3 => {
                let short = |i: usize| -> Result<u8> { Ok(channel(i..i + 1)? * 17) };
                Ok(Self::rgb(short(0)?, short(1)?, short(2)?))
            }
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Same colour with alpha scaled by `opacity` (0.0 to 1.0)
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let alpha = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self::new(self.r, self.g, self.b, alpha)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[cfg(feature = "egui")]
impl From<Color> for Color32 {
    fn from(color: Color) -> Self {
        Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

/// Style for parcel polygons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    /// Stroke and fill share one colour
    pub color: Color,
    pub fill_opacity: f32,
    /// Stroke width in pixels
    pub weight: f32,
}

/// Style for polylines (the lasso guide)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color,
    pub weight: f32,
    /// Dash pattern in pixels, empty for a solid line
    pub dash_pattern: Vec<f32>,
}

/// Style for cluster markers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleStyle {
    pub fill: Color,
    pub fill_opacity: f32,
    pub stroke: Color,
    pub weight: f32,
}

/// Style for permanent text labels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub text: Color,
    pub background: Option<Color>,
    pub font_size: f32,
}

/// Colours the map draws with. Defaults reproduce the admin map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelPalette {
    pub unassigned: Color,
    pub assigned: Color,
    pub selected: Color,
    pub cluster: Color,
    pub lasso_guide: Color,
    pub label_text: Color,
    pub label_background: Color,
}

impl Default for ParcelPalette {
    fn default() -> Self {
        Self {
            unassigned: Color::rgb(0x22, 0xc5, 0x5e),
            assigned: Color::rgb(0x3b, 0x82, 0xf6),
            selected: Color::rgb(0xf5, 0x9e, 0x0b),
            cluster: Color::rgb(0x3b, 0x82, 0xf6),
            lasso_guide: Color::rgb(0xf5, 0x9e, 0x0b),
            label_text: Color::WHITE,
            label_background: Color::new(0, 0, 0, 178),
        }
    }
}

impl ParcelPalette {
    /// Polygon style as a pure function of selection and listing binding.
    /// Selection wins over binding.
    pub fn parcel_style(&self, is_selected: bool, is_assigned: bool) -> PolygonStyle {
        let color = if is_selected {
            self.selected
        } else if is_assigned {
            self.assigned
        } else {
            self.unassigned
        };

        PolygonStyle {
            color,
            fill_opacity: if is_selected { 0.5 } else { 0.3 },
            weight: if is_selected { 3.0 } else { 2.0 },
        }
    }

    pub fn cluster_style(&self) -> CircleStyle {
        CircleStyle {
            fill: self.cluster,
            fill_opacity: 0.7,
            stroke: Color::WHITE,
            weight: 2.0,
        }
    }

    pub fn lasso_style(&self) -> LineStyle {
        LineStyle {
            color: self.lasso_guide,
            weight: 2.0,
            dash_pattern: vec![5.0, 5.0],
        }
    }

    pub fn cadastral_label(&self) -> LabelStyle {
        LabelStyle {
            text: self.label_text,
            background: Some(self.label_background),
            font_size: 10.0,
        }
    }

    pub fn count_label(&self) -> LabelStyle {
        LabelStyle {
            text: Color::WHITE,
            background: None,
            font_size: 12.0,
        }
    }
}

/// Marker radius range and the count at which it saturates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusScale {
    pub min_px: f64,
    pub max_px: f64,
    pub saturation_count: u64,
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self {
            min_px: CLUSTER_MIN_RADIUS_PX,
            max_px: CLUSTER_MAX_RADIUS_PX,
            saturation_count: CLUSTER_SATURATION_COUNT,
        }
    }
}

impl RadiusScale {
    /// Radius grows with `ln(count)`; one parcel maps to `min_px` and
    /// `saturation_count` or more to `max_px`
    pub fn radius(&self, count: u64) -> f64 {
        if self.saturation_count <= 1 {
            return self.max_px;
        }
        let t = (count.max(1) as f64).ln() / (self.saturation_count as f64).ln();
        let radius = self.min_px + (self.max_px - self.min_px) * t;
        radius.clamp(self.min_px, self.max_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Color::from_hex("#22c55e").unwrap(), Color::rgb(0x22, 0xc5, 0x5e));
        assert_eq!(Color::from_hex("fff").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("#000000b2").unwrap(), Color::new(0, 0, 0, 178));
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        assert_eq!(Color::rgb(0xf5, 0x9e, 0x0b).to_hex(), "#f59e0b");
    }

    #[test]
    fn test_palette_deserializes_partial_json() {
        let palette: ParcelPalette = serde_json::from_str(r##"{"selected": "#ff0000"}"##).unwrap();
        assert_eq!(palette.selected, Color::rgb(255, 0, 0));
        assert_eq!(palette.assigned, ParcelPalette::default().assigned);
    }

    #[test]
    fn test_parcel_style_matrix() {
        let palette = ParcelPalette::default();

        let unassigned = palette.parcel_style(false, false);
        assert_eq!(unassigned.color.to_hex(), "#22c55e");
        assert_eq!(unassigned.fill_opacity, 0.3);
        assert_eq!(unassigned.weight, 2.0);

        let assigned = palette.parcel_style(false, true);
        assert_eq!(assigned.color.to_hex(), "#3b82f6");

        for assigned in [false, true] {
            let selected = palette.parcel_style(true, assigned);
            assert_eq!(selected.color.to_hex(), "#f59e0b");
            assert_eq!(selected.fill_opacity, 0.5);
            assert_eq!(selected.weight, 3.0);
        }
    }

    #[test]
    fn test_cluster_radius_is_monotonic_and_clamped() {
        let scale = RadiusScale::default();
        assert_eq!(scale.radius(1), 14.0);
        assert_eq!(scale.radius(0), 14.0);
        assert_eq!(scale.radius(1000), 48.0);
        assert_eq!(scale.radius(5000), 48.0);

        let mut previous = 0.0;
        for count in [1, 2, 10, 42, 100, 999] {
            let radius = scale.radius(count);
            assert!(radius >= previous);
            previous = radius;
        }
    }
}

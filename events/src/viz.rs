//! Visualization parameters and colormaps.

use crate::error::CollectionError;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys understood by the service when rendering thumbnails.
pub const VISUALIZATION_KEYS: [&str; 8] = [
    "bands", "min", "max", "gain", "bias", "gamma", "palette", "opacity",
];

/// Number of entries in a [`Colormap`] lookup table.
pub const COLORMAP_LEN: usize = 256;

/// Free-form visualization settings, e.g.
///
/// ```json
/// { "min": 0, "max": 40, "palette": ["040274", "f5f5f5", "ff0000"], "unit": "°C", "value": "LST" }
/// ```
///
/// Nothing is validated until a plot needs it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VizParams(Map<String, Value>);

impl VizParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn min(&self) -> Option<f64> {
        self.get("min").and_then(Value::as_f64)
    }

    pub fn max(&self) -> Option<f64> {
        self.get("max").and_then(Value::as_f64)
    }

    /// Palette colors, given either as a list or a comma separated
    /// string.
    pub fn palette(&self) -> Option<Vec<String>> {
        match self.get("palette")? {
            Value::Array(colors) => colors
                .iter()
                .map(|c| c.as_str().map(str::to_owned))
                .collect(),
            Value::String(colors) => Some(
                colors
                    .split(',')
                    .map(|c| c.trim().to_owned())
                    .filter(|c| !c.is_empty())
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn unit(&self) -> &str {
        self.get("unit").and_then(Value::as_str).unwrap_or("")
    }

    pub fn value_name(&self) -> &str {
        self.get("value").and_then(Value::as_str).unwrap_or("value")
    }

    /// Colorbar caption, `"<value> [<unit>]"`.
    pub fn legend_caption(&self) -> String {
        format!("{} [{}]", self.value_name(), self.unit())
    }

    /// The subset of parameters forwarded to the service.
    pub fn visualization(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| VISUALIZATION_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the colorbar described by `min`, `max` and `palette`,
    /// or `None` if any of them is missing.
    pub fn colorbar(&self) -> Result<Option<Colorbar>, CollectionError> {
        let (Some(min), Some(max), Some(palette)) = (self.min(), self.max(), self.palette())
        else {
            return Ok(None);
        };
        Ok(Some(Colorbar {
            min,
            max,
            colormap: Colormap::from_palette(&palette)?,
            caption: self.legend_caption(),
        }))
    }
}

impl From<Map<String, Value>> for VizParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    pub min: f64,
    pub max: f64,
    pub colormap: Colormap,
    pub caption: String,
}

/// Evenly spaced palette anchors, linearly interpolated into a
/// [`COLORMAP_LEN`] entry lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    lut: Vec<RGBColor>,
}

impl Colormap {
    pub fn from_palette<S: AsRef<str>>(palette: &[S]) -> Result<Self, CollectionError> {
        let anchors = palette
            .iter()
            .map(|c| parse_color(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let lut = match anchors.as_slice() {
            [] => return Err(CollectionError::Palette(String::new())),
            [only] => vec![*only; COLORMAP_LEN],
            _ => (0..COLORMAP_LEN)
                .map(|i| interpolate(&anchors, i as f64 / (COLORMAP_LEN - 1) as f64))
                .collect(),
        };
        Ok(Self { lut })
    }

    /// Color for `t` in `[0, 1]`; values outside are clamped.
    pub fn color(&self, t: f64) -> RGBColor {
        let idx = (t.clamp(0.0, 1.0) * COLORMAP_LEN as f64) as usize;
        self.lut[idx.min(COLORMAP_LEN - 1)]
    }

    pub fn lut(&self) -> &[RGBColor] {
        &self.lut
    }
}

fn interpolate(anchors: &[RGBColor], t: f64) -> RGBColor {
    let segments = (anchors.len() - 1) as f64;
    let pos = t * segments;
    let lo = (pos.floor() as usize).min(anchors.len() - 2);
    let frac = pos - lo as f64;
    let (RGBColor(r0, g0, b0), RGBColor(r1, g1, b1)) = (anchors[lo], anchors[lo + 1]);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Parses `#RRGGBB`, `RRGGBB`, `#RGB`, `RGB` or a basic color name.
pub fn parse_color(color: &str) -> Result<RGBColor, CollectionError> {
    let invalid = || CollectionError::Palette(color.to_owned());
    let hex = color.trim().trim_start_matches('#');
    let named = match hex.to_ascii_lowercase().as_str() {
        "black" => Some("000000"),
        "white" => Some("ffffff"),
        "red" => Some("ff0000"),
        "green" => Some("008000"),
        "blue" => Some("0000ff"),
        "yellow" => Some("ffff00"),
        "cyan" => Some("00ffff"),
        "magenta" => Some("ff00ff"),
        "orange" => Some("ffa500"),
        "purple" => Some("800080"),
        "brown" => Some("a52a2a"),
        "gray" | "grey" => Some("808080"),
        _ => None,
    };
    let hex = named.unwrap_or(hex);
    if !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok(RGBColor(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let short = |s: &str| channel(s).map(|v| v * 17);
            Ok(RGBColor(
                short(&hex[0..1])?,
                short(&hex[1..2])?,
                short(&hex[2..3])?,
            ))
        }
        _ => Err(invalid()),
    }
}

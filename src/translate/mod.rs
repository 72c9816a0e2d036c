//! Translation of simplified styling options into Plotly trace and layout
//! patches.
//!
//! The caller's option map is never modified: translators copy it into a
//! [`Params`] working set and take recognised keys out of the copy. Whatever
//! is left over is forwarded (single plots) or reported (subplots).

pub mod single;
pub mod subplot;

use crate::error::{PlotError, PlotResult};
use crate::palette::BORDER_COLOR;
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;

pub use single::{translate, SinglePlotStyle};
pub use subplot::{broadcast, translate_subplots, SubplotStyle};

// =============================================================================
// Working copy of the caller's options
// =============================================================================

#[derive(Debug, Clone)]
pub struct Params {
    map: Map<String, Value>,
}

impl Params {
    pub fn new(source: &Map<String, Value>) -> Self {
        Self { map: source.clone() }
    }

    /// Remove a key; an explicit null counts as absent
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.map.remove(key).filter(|v| !v.is_null())
    }

    pub fn take_string(&mut self, key: &str) -> PlotResult<Option<String>> {
        self.take(key).map(|v| as_text(key, &v)).transpose()
    }

    pub fn take_f64(&mut self, key: &str) -> PlotResult<Option<f64>> {
        self.take(key).map(|v| as_f64(key, &v)).transpose()
    }

    pub fn take_u32(&mut self, key: &str) -> PlotResult<Option<u32>> {
        self.take(key).map(|v| as_u32(key, &v)).transpose()
    }

    pub fn take_bool(&mut self, key: &str) -> PlotResult<Option<bool>> {
        self.take(key).map(|v| as_bool(key, &v)).transpose()
    }

    pub fn take_range(&mut self, key: &str) -> PlotResult<Option<AxisRange>> {
        self.take(key).map(|v| as_range(key, &v)).transpose()
    }

    /// Take a string option and convert it to an enumerated value
    pub fn take_parsed<T>(&mut self, key: &str) -> PlotResult<Option<T>>
    where
        T: FromStr<Err = PlotError>,
    {
        self.take_string(key)?.map(|s| s.parse()).transpose()
    }

    /// Rewrite a string option in place without consuming it
    pub fn rewrite(&mut self, key: &str, f: impl Fn(&str) -> String) {
        if let Some(Value::String(s)) = self.map.get_mut(key) {
            *s = f(s);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.map
    }
}

pub(crate) fn as_text(key: &str, v: &Value) -> PlotResult<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(PlotError::invalid(key, format!("expected text, got {}", v))),
    }
}

pub(crate) fn as_f64(key: &str, v: &Value) -> PlotResult<f64> {
    v.as_f64()
        .ok_or_else(|| PlotError::invalid(key, format!("expected a number, got {}", v)))
}

pub(crate) fn as_u32(key: &str, v: &Value) -> PlotResult<u32> {
    match v.as_f64() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(n as u32),
        _ => Err(PlotError::invalid(key, format!("expected a pixel count, got {}", v))),
    }
}

pub(crate) fn as_bool(key: &str, v: &Value) -> PlotResult<bool> {
    v.as_bool()
        .ok_or_else(|| PlotError::invalid(key, format!("expected true or false, got {}", v)))
}

pub(crate) fn as_range(key: &str, v: &Value) -> PlotResult<AxisRange> {
    match v.as_array().map(Vec::as_slice) {
        Some([lo, hi]) if !lo.is_array() && !hi.is_array() => Ok(AxisRange([lo.clone(), hi.clone()])),
        _ => Err(PlotError::invalid(key, format!("expected [min, max], got {}", v))),
    }
}

// =============================================================================
// Enumerated options
// =============================================================================

/// Named legend placements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendLocation {
    InnerNW,
    InnerNE,
    InnerSW,
    InnerSE,
    OuterE,
    OuterW,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendAnchor {
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
}

impl LegendLocation {
    pub fn anchor(self) -> LegendAnchor {
        let (x, y, xanchor, yanchor) = match self {
            LegendLocation::InnerNW => (0.01, 0.99, "left", "top"),
            LegendLocation::InnerNE => (0.99, 0.99, "right", "top"),
            LegendLocation::InnerSW => (0.01, 0.01, "left", "bottom"),
            LegendLocation::InnerSE => (0.99, 0.01, "right", "bottom"),
            LegendLocation::OuterE => (1.02, 1.0, "left", "top"),
            LegendLocation::OuterW => (-0.1, 1.0, "right", "top"),
        };
        LegendAnchor { x, y, xanchor, yanchor }
    }
}

impl FromStr for LegendLocation {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "innerNW" => Ok(LegendLocation::InnerNW),
            "innerNE" => Ok(LegendLocation::InnerNE),
            "innerSW" => Ok(LegendLocation::InnerSW),
            "innerSE" => Ok(LegendLocation::InnerSE),
            "outerE" => Ok(LegendLocation::OuterE),
            "outerW" => Ok(LegendLocation::OuterW),
            other => Err(PlotError::invalid(
                "legend_location",
                format!(
                    "'{}' is not one of innerNW, innerNE, innerSW, innerSE, outerE, outerW",
                    other
                ),
            )),
        }
    }
}

/// Named figure sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureSize {
    Large,
    Medium,
    Small,
}

impl FigureSize {
    /// (width, height) in pixels
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            FigureSize::Large => (1600, 1000),
            FigureSize::Medium => (1100, 800),
            FigureSize::Small => (900, 600),
        }
    }
}

impl FromStr for FigureSize {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "large" => Ok(FigureSize::Large),
            "medium" => Ok(FigureSize::Medium),
            "small" => Ok(FigureSize::Small),
            other => Err(PlotError::invalid(
                "size",
                format!("'{}' is not one of large, medium, small", other),
            )),
        }
    }
}

/// Map step-plot names onto Plotly line shapes; other shapes pass through.
pub fn alias_line_shape(shape: &str) -> &str {
    match shape {
        "steps-pre" => "vh",
        "steps-post" => "hv",
        "steps-mid" => "hvh",
        other => other,
    }
}

// =============================================================================
// Patch types
// =============================================================================

pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Serialize a patch for `Figure::update_*`
pub fn to_patch<T: Serialize>(style: &T) -> PlotResult<Value> {
    Ok(serde_json::to_value(style)?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

/// Two-element axis range, passed through unchanged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisRange(pub [Value; 2]);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// How each series is drawn
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "is_default")]
    pub line: LineStyle,
    #[serde(skip_serializing_if = "is_default")]
    pub marker: MarkerStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quartilemethod: Option<String>,
}

/// Visible frame line drawn along an axis and mirrored on the opposite side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderStyle {
    pub showline: bool,
    pub linecolor: &'static str,
    pub linewidth: u32,
    pub mirror: bool,
}

impl BorderStyle {
    pub fn new(showline: bool) -> Self {
        Self {
            showline,
            linecolor: BORDER_COLOR,
            linewidth: 1,
            mirror: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AxisStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<AxisRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponentformat: Option<String>,
    #[serde(flatten)]
    pub border: Option<BorderStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneAxis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
}

/// Axis titles of a 3D scene
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneStyle {
    pub xaxis: SceneAxis,
    pub yaxis: SceneAxis,
    pub zaxis: SceneAxis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LegendStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<&'static str>,
    /// `Some(None)` clears a border colour set earlier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bordercolor: Option<Option<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borderwidth: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColorBar {
    pub title: Title,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColorAxisStyle {
    pub colorbar: ColorBar,
}

/// Figure-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "is_default")]
    pub xaxis: AxisStyle,
    #[serde(skip_serializing_if = "is_default")]
    pub yaxis: AxisStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coloraxis: Option<ColorAxisStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "is_default")]
    pub legend: LegendStyle,
}

// =============================================================================
// Options shared by both translators
// =============================================================================

/// Explicit width/height, overridden by a named `size`
pub(crate) fn apply_sizing(p: &mut Params, layout: &mut LayoutStyle) -> PlotResult<()> {
    layout.width = p.take_u32("width")?;
    layout.height = p.take_u32("height")?;
    if let Some(size) = p.take_parsed::<FigureSize>("size")? {
        let (w, h) = size.dimensions();
        layout.width = Some(w);
        layout.height = Some(h);
    }
    Ok(())
}

pub(crate) fn legend_style(p: &mut Params) -> PlotResult<LegendStyle> {
    let mut legend = LegendStyle {
        title: p.take_string("legend_title")?.map(Title::new),
        ..Default::default()
    };

    if let Some(location) = p.take_parsed::<LegendLocation>("legend_location")? {
        let anchor = location.anchor();
        legend.x = Some(anchor.x);
        legend.y = Some(anchor.y);
        legend.xanchor = Some(anchor.xanchor);
        legend.yanchor = Some(anchor.yanchor);
    }

    match p.take_bool("legend_borders")? {
        Some(true) => {
            legend.bordercolor = Some(Some(BORDER_COLOR));
            legend.borderwidth = Some(1);
        }
        Some(false) => {
            legend.bordercolor = Some(None);
            legend.borderwidth = Some(0);
        }
        None => {}
    }

    Ok(legend)
}

// Library exports for tcplot

pub mod data;
pub mod error;
pub mod express;
pub mod figure;
pub mod logo;
pub mod palette;
pub mod parser;
pub mod render;
pub mod subplot;
pub mod translate;

pub use data::{Column, ColumnLabel, CsvLayout, PlotData};
pub use error::{PlotError, PlotResult};
pub use express::Selector;
pub use figure::Figure;
pub use render::render;

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Plot kinds understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum PlotKind {
    #[default]
    Line,
    Scatter,
    Bar,
    Imshow,
    Scatter3d,
    Box,
    Hist,
}

impl PlotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlotKind::Line => "line",
            PlotKind::Scatter => "scatter",
            PlotKind::Bar => "bar",
            PlotKind::Imshow => "imshow",
            PlotKind::Scatter3d => "scatter3d",
            PlotKind::Box => "box",
            PlotKind::Hist => "hist",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlotKind {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(PlotKind::Line),
            "scatter" => Ok(PlotKind::Scatter),
            "bar" => Ok(PlotKind::Bar),
            "imshow" => Ok(PlotKind::Imshow),
            "scatter3d" => Ok(PlotKind::Scatter3d),
            "box" => Ok(PlotKind::Box),
            "hist" => Ok(PlotKind::Hist),
            other => Err(PlotError::UnknownKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for PlotKind {
    type Error = PlotError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Encoding of the rendered figure
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "json")]
    #[default]
    Json,
    #[serde(rename = "html")]
    Html,
}

/// Everything but the table: kind, selectors, logos and styling options.
///
/// Unrecognised fields land in `params`, so a JSON config such as
/// `{"kind": "bar", "title": "Flow", "size": "small"}` deserializes directly.
#[derive(Debug, Clone, Deserialize)]
pub struct PlotOptions {
    #[serde(default)]
    pub kind: PlotKind,
    #[serde(default)]
    pub x: Option<Selector>,
    #[serde(default)]
    pub y: Option<Selector>,
    #[serde(default)]
    pub z: Option<String>,
    #[serde(default = "default_show")]
    pub show: bool,
    #[serde(default, alias = "main_logo_source")]
    pub main_logo: Option<String>,
    #[serde(default, alias = "proj_logo_source")]
    pub proj_logo: Option<String>,
    #[serde(default)]
    pub subplots: bool,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

fn default_show() -> bool { true }

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            kind: PlotKind::Line,
            x: None,
            y: None,
            z: None,
            show: true,
            main_logo: None,
            proj_logo: None,
            subplots: false,
            params: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_round_trip_names() {
        for name in ["line", "scatter", "bar", "imshow", "scatter3d", "box", "hist"] {
            assert_eq!(name.parse::<PlotKind>().unwrap().as_str(), name);
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = "density_heatmap".parse::<PlotKind>().unwrap_err();
        assert!(matches!(err, PlotError::UnknownKind(k) if k == "density_heatmap"));
    }

    #[test]
    fn test_options_from_json() {
        let options: PlotOptions = serde_json::from_value(json!({
            "kind": "bar",
            "x": "time",
            "y": ["temp", "pressure"],
            "main_logo_source": "https://example.com/logo.png",
            "title": "Flow",
            "ylim": [0, 5]
        }))
        .unwrap();
        assert_eq!(options.kind, PlotKind::Bar);
        assert_eq!(options.x, Some(Selector::Column("time".to_string())));
        assert_eq!(
            options.y,
            Some(Selector::Columns(vec!["temp".to_string(), "pressure".to_string()]))
        );
        assert!(options.show);
        assert!(!options.subplots);
        assert_eq!(options.main_logo.as_deref(), Some("https://example.com/logo.png"));
        assert_eq!(options.params.len(), 2);
        assert_eq!(options.params["ylim"], json!([0, 5]));
    }

    #[test]
    fn test_options_reject_unknown_kind() {
        let res: Result<PlotOptions, _> = serde_json::from_value(json!({"kind": "pie"}));
        assert!(res.is_err());
    }

    #[test]
    fn test_options_defaults() {
        let options: PlotOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options.kind, PlotKind::Line);
        assert!(options.show);
        assert!(options.params.is_empty());
    }
}

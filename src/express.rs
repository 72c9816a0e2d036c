//! Plot primitives.
//!
//! Each primitive builds a base figure from the table and the x/y(/z)
//! selectors in wide form: one trace per selected y series sharing the x
//! series, coloured from a discrete sequence, with axis titles taken from the
//! selected columns. Traces and base layouts come from the typed `plotly`
//! builders. Primitives accept a fixed set of keyword arguments and reject
//! anything else.

use crate::data::PlotData;
use crate::error::{PlotError, PlotResult};
use crate::figure::{merge_value, plotly_value, Figure};
use crate::palette::ColorPalette;
use crate::translate::{as_text, AxisRange, Params};
use crate::PlotKind;
use plotly::common::{DashType, Line, LineShape, Marker, MarkerSymbol, Mode, Title};
use plotly::layout::themes::BuiltinTheme;
use plotly::layout::{Axis, BarMode, BoxMode, Layout, Legend, Margin};
use plotly::{Bar, BoxPlot, HeatMap, Histogram, Scatter, Scatter3D};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Which values feed an axis
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    /// One column by name
    Column(String),
    /// Several columns by name, or raw labels when there is no table
    Columns(Vec<String>),
    /// Raw values, independent of the table
    Values(Vec<Value>),
    /// The table index
    #[serde(skip)]
    Index,
}

/// Inputs shared by all primitives
#[derive(Debug, Clone)]
pub struct PlotInput<'a> {
    pub data: Option<&'a PlotData>,
    pub x: Option<Selector>,
    pub y: Option<Selector>,
    pub z: Option<String>,
}

pub type Primitive = fn(&PlotInput<'_>, &Map<String, Value>) -> PlotResult<Figure>;

/// Pick the primitive drawing a plot kind
pub fn select(kind: PlotKind) -> Primitive {
    match kind {
        PlotKind::Line => line,
        PlotKind::Scatter => scatter,
        PlotKind::Bar => bar,
        PlotKind::Imshow => imshow,
        PlotKind::Scatter3d => scatter_3d,
        PlotKind::Box => box_plot,
        PlotKind::Hist => histogram,
    }
}

/// A named run of values resolved from a selector
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: Option<String>,
    pub values: Vec<Value>,
}

fn require_data<'a>(data: Option<&'a PlotData>, what: &str) -> PlotResult<&'a PlotData> {
    data.ok_or_else(|| PlotError::TypeContract(format!("{} requires data", what)))
}

/// Resolve a selector against the table.
///
/// Without a table a list of names has nothing to look up, so it is taken
/// as raw (categorical) values.
pub fn resolve(data: Option<&PlotData>, selector: &Selector) -> PlotResult<Vec<Series>> {
    match selector {
        Selector::Index => {
            let data = require_data(data, "the index selector")?;
            Ok(vec![Series {
                name: Some(data.index_name.clone().unwrap_or_else(|| "index".to_string())),
                values: data.index.clone(),
            }])
        }
        Selector::Column(name) => {
            let data = require_data(data, &format!("column selector '{}'", name))?;
            Ok(vec![Series {
                name: Some(name.clone()),
                values: data.column(name)?.values.clone(),
            }])
        }
        Selector::Columns(names) if data.is_none() => Ok(vec![Series {
            name: None,
            values: names.iter().map(|n| Value::String(n.clone())).collect(),
        }]),
        Selector::Columns(names) => names
            .iter()
            .map(|n| resolve(data, &Selector::Column(n.clone())).map(|mut s| s.remove(0)))
            .collect(),
        Selector::Values(values) => Ok(vec![Series {
            name: None,
            values: values.clone(),
        }]),
    }
}

fn resolve_one(data: Option<&PlotData>, selector: &Selector, axis: &str) -> PlotResult<Series> {
    let mut series = resolve(data, selector)?;
    if series.len() != 1 {
        return Err(PlotError::invalid(axis, "expected a single series"));
    }
    Ok(series.remove(0))
}

fn require_column<'a>(selector: &'a Option<Selector>, axis: &str) -> PlotResult<&'a str> {
    match selector {
        Some(Selector::Column(name)) => Ok(name),
        _ => Err(PlotError::invalid(axis, "expected a column name")),
    }
}

// =============================================================================
// Keyword arguments
// =============================================================================

struct Kwargs {
    kind: PlotKind,
    params: Params,
}

impl Kwargs {
    fn new(kind: PlotKind, map: &Map<String, Value>) -> Self {
        Self {
            kind,
            params: Params::new(map),
        }
    }

    fn palette(&mut self) -> PlotResult<ColorPalette> {
        match self.params.take("color_discrete_sequence") {
            None => Ok(ColorPalette::default()),
            Some(Value::Array(items)) => Ok(ColorPalette::new(
                items
                    .iter()
                    .map(|v| as_text("color_discrete_sequence", v))
                    .collect::<PlotResult<Vec<String>>>()?,
            )),
            Some(other) => Err(PlotError::invalid(
                "color_discrete_sequence",
                format!("expected a list of colours, got {}", other),
            )),
        }
    }

    fn orientation(&mut self) -> PlotResult<Orientation> {
        match self.params.take_string("orientation")?.as_deref() {
            None | Some("v") => Ok(Orientation::Vertical),
            Some("h") => Ok(Orientation::Horizontal),
            Some(other) => Err(PlotError::invalid(
                "orientation",
                format!("expected 'v' or 'h', got '{}'", other),
            )),
        }
    }

    /// `log_x` / `log_y` switch the axis type
    fn log_axes(&mut self, fig: &mut Figure) -> PlotResult<()> {
        for (key, axis) in [("log_x", "xaxis"), ("log_y", "yaxis")] {
            if self.params.take_bool(key)? == Some(true) {
                fig.update_layout(&json!({ axis: {"type": "log"} }));
            }
        }
        Ok(())
    }

    /// Hover columns shown next to each point, as a patch for every trace
    fn hover_data(&mut self, data: Option<&PlotData>, axes: &[&str]) -> PlotResult<Option<Value>> {
        let names = match self.params.take("hover_data") {
            None => return Ok(None),
            Some(Value::String(name)) => vec![name],
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| as_text("hover_data", v))
                .collect::<PlotResult<Vec<String>>>()?,
            Some(other) => {
                return Err(PlotError::invalid(
                    "hover_data",
                    format!("expected a column or a list of columns, got {}", other),
                ))
            }
        };
        let data = require_data(data, "hover_data")?;
        let columns = names
            .iter()
            .map(|n| data.column(n))
            .collect::<PlotResult<Vec<_>>>()?;
        let rows: Vec<Value> = (0..data.nrows())
            .map(|r| Value::Array(columns.iter().map(|c| c.values[r].clone()).collect()))
            .collect();

        let mut lines: Vec<String> = axes.iter().map(|a| format!("{}=%{{{}}}", a, a)).collect();
        lines.extend(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| format!("{}=%{{customdata[{}]}}", n, i)),
        );
        Ok(Some(json!({
            "customdata": rows,
            "hovertemplate": format!("{}<extra></extra>", lines.join("<br>")),
        })))
    }

    /// Figure-level keywords every primitive accepts
    fn common(&mut self) -> PlotResult<Common> {
        let labels = match self.params.take("labels") {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(PlotError::invalid(
                    "labels",
                    format!("expected a map of names to labels, got {}", other),
                ))
            }
        };
        let color_map = match self.params.take("color_discrete_map") {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(PlotError::invalid(
                    "color_discrete_map",
                    format!("expected a map of names to colours, got {}", other),
                ))
            }
        };
        let template = self.params.take("template").map(template).transpose()?;
        Ok(Common {
            title: self.params.take_string("title")?,
            template,
            labels,
            color_map,
            range_x: self.params.take_range("range_x")?,
            range_y: self.params.take_range("range_y")?,
            width: self.params.take_u32("width")?,
            height: self.params.take_u32("height")?,
        })
    }

    fn finish(self) -> PlotResult<()> {
        match self.params.keys().next() {
            Some(key) => Err(PlotError::UnexpectedKeyword {
                kind: function_name(self.kind).to_string(),
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Resolve a template name to the plotly template object
fn template(value: Value) -> PlotResult<Value> {
    let theme = match &value {
        Value::Object(_) => return Ok(value),
        Value::String(name) => match name.as_str() {
            "plotly" => BuiltinTheme::Default,
            "plotly_white" => BuiltinTheme::PlotlyWhite,
            "plotly_dark" => BuiltinTheme::PlotlyDark,
            other => {
                return Err(PlotError::invalid(
                    "template",
                    format!("expected plotly, plotly_white or plotly_dark, got '{}'", other),
                ))
            }
        },
        other => {
            return Err(PlotError::invalid(
                "template",
                format!("expected a template name or object, got {}", other),
            ))
        }
    };
    plotly_value(&theme.build())
}

/// Keywords shared by all primitives, applied once the figure is built
struct Common {
    title: Option<String>,
    template: Option<Value>,
    labels: Map<String, Value>,
    color_map: Map<String, Value>,
    range_x: Option<AxisRange>,
    range_y: Option<AxisRange>,
    width: Option<u32>,
    height: Option<u32>,
}

impl Common {
    fn apply(self, fig: &mut Figure, kind: PlotKind) -> PlotResult<()> {
        let mut layout = Map::new();
        if let Some(title) = self.title {
            layout.insert("title".to_string(), json!({ "text": title }));
        }
        if let Some(template) = self.template {
            layout.insert("template".to_string(), template);
        }
        if let Some(w) = self.width {
            layout.insert("width".to_string(), json!(w));
        }
        if let Some(h) = self.height {
            layout.insert("height".to_string(), json!(h));
        }
        for (axis, range) in [("xaxis", self.range_x), ("yaxis", self.range_y)] {
            if let Some(range) = range {
                let patch = json!({ axis: { "range": range.0 } });
                if kind == PlotKind::Scatter3d {
                    layout.insert("scene".to_string(), merged(layout.get("scene"), &patch));
                } else {
                    layout.insert(axis.to_string(), patch[axis].clone());
                }
            }
        }
        fig.update_layout(&Value::Object(layout));

        if !self.labels.is_empty() {
            for value in fig.layout.values_mut() {
                relabel(value, &self.labels);
            }
        }
        for trace in &mut fig.data {
            let color = trace["name"]
                .as_str()
                .and_then(|name| self.color_map.get(name))
                .cloned();
            if let Some(color) = color {
                let color = json!(as_text("color_discrete_map", &color)?);
                let mut patch = json!({"marker": {"color": color}});
                if trace.get("line").is_some() {
                    patch["line"] = json!({"color": color});
                }
                merge_value(trace, &patch);
            }
        }
        Ok(())
    }
}

fn merged(base: Option<&Value>, patch: &Value) -> Value {
    let mut value = base.cloned().unwrap_or_else(|| json!({}));
    merge_value(&mut value, patch);
    value
}

/// Replace every title whose text is a key of `labels`
fn relabel(value: &mut Value, labels: &Map<String, Value>) {
    let Value::Object(obj) = value else { return };
    if let Some(title) = obj.get_mut("title") {
        let renamed = title["text"].as_str().and_then(|t| labels.get(t)).cloned();
        if let Some(label) = renamed {
            title["text"] = label;
        }
    }
    for child in obj.values_mut() {
        relabel(child, labels);
    }
}

fn function_name(kind: PlotKind) -> &'static str {
    match kind {
        PlotKind::Scatter3d => "scatter_3d",
        PlotKind::Hist => "histogram",
        other => other.as_str(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    fn plotly(self) -> plotly::common::Orientation {
        match self {
            Orientation::Vertical => plotly::common::Orientation::Vertical,
            Orientation::Horizontal => plotly::common::Orientation::Horizontal,
        }
    }
}

fn line_shape(shape: &str) -> PlotResult<LineShape> {
    match shape {
        "linear" => Ok(LineShape::Linear),
        "spline" => Ok(LineShape::Spline),
        "hv" => Ok(LineShape::Hv),
        "vh" => Ok(LineShape::Vh),
        "hvh" => Ok(LineShape::Hvh),
        "vhv" => Ok(LineShape::Vhv),
        other => Err(PlotError::invalid(
            "line_shape",
            format!("expected linear, spline, hv, vh, hvh or vhv, got '{}'", other),
        )),
    }
}

fn base_layout() -> Layout {
    Layout::new()
        .legend(Legend::new().trace_group_gap(0))
        .margin(Margin::new().top(60))
}

fn titled(axis: Axis, title: Option<String>) -> Axis {
    match title {
        Some(t) => axis.title(Title::from(t.as_str())),
        None => axis,
    }
}

// =============================================================================
// Wide-form 2D construction
// =============================================================================

struct WideForm {
    x: Option<Series>,
    ys: Vec<Series>,
}

/// One y series placed on the plot axes
struct Placed {
    name: String,
    show_legend: bool,
    x: Option<Vec<Value>>,
    y: Option<Vec<Value>>,
}

impl Placed {
    fn x(&self) -> Vec<Value> {
        self.x.clone().unwrap_or_default()
    }

    fn y(&self) -> Vec<Value> {
        self.y.clone().unwrap_or_default()
    }

    /// JSON form of a typed trace, dropping the axes this series leaves unset
    fn finish<T: Serialize>(&self, trace: &T) -> PlotResult<Value> {
        let mut value = plotly_value(trace)?;
        if let Value::Object(obj) = &mut value {
            if self.x.is_none() {
                obj.remove("x");
            }
            if self.y.is_none() {
                obj.remove("y");
            }
        }
        Ok(value)
    }
}

impl WideForm {
    fn resolve(input: &PlotInput<'_>) -> PlotResult<Self> {
        let x = input
            .x
            .as_ref()
            .map(|sel| resolve_one(input.data, sel, "x"))
            .transpose()?;
        let ys = match &input.y {
            Some(sel) => resolve(input.data, sel)?,
            None => Vec::new(),
        };
        if let Some(x) = &x {
            if let Some(bad) = ys.iter().find(|y| y.values.len() != x.values.len()) {
                return Err(PlotError::InvalidData(format!(
                    "x has {} values but '{}' has {}",
                    x.values.len(),
                    bad.name.as_deref().unwrap_or("y"),
                    bad.values.len()
                )));
            }
        }
        Ok(Self { x, ys })
    }

    fn is_multi(&self) -> bool {
        self.ys.len() > 1
    }

    /// One placement per y series; horizontal plots swap the axes
    fn placed(&self, orientation: Orientation) -> Vec<Placed> {
        let multi = self.is_multi();
        self.ys
            .iter()
            .map(|y| {
                let name = if multi { y.name.clone().unwrap_or_default() } else { String::new() };
                let xs = self.x.as_ref().map(|x| x.values.clone());
                let ys = Some(y.values.clone());
                let (x, y) = match orientation {
                    Orientation::Vertical => (xs, ys),
                    Orientation::Horizontal => (ys, xs),
                };
                Placed { name, show_legend: multi, x, y }
            })
            .collect()
    }

    fn layout(&self, orientation: Orientation) -> Layout {
        let x_title = self.x.as_ref().and_then(|x| x.name.clone());
        let y_title = match self.ys.as_slice() {
            [single] => single.name.clone(),
            [] => None,
            _ => Some("value".to_string()),
        };
        let (x_title, y_title) = match orientation {
            Orientation::Vertical => (x_title, y_title),
            Orientation::Horizontal => (y_title, x_title),
        };

        let mut legend = Legend::new().trace_group_gap(0);
        if self.is_multi() {
            legend = legend.title(Title::from("variable"));
        }
        base_layout()
            .x_axis(titled(Axis::new().anchor("y").domain(&[0.0, 1.0]), x_title))
            .y_axis(titled(Axis::new().anchor("x").domain(&[0.0, 1.0]), y_title))
            .legend(legend)
    }
}

fn require_y(form: &WideForm, kind: PlotKind) -> PlotResult<()> {
    if form.ys.is_empty() {
        return Err(PlotError::TypeContract(format!(
            "{}() needs y values",
            function_name(kind)
        )));
    }
    Ok(())
}

pub fn line(input: &PlotInput<'_>, kwargs: &Map<String, Value>) -> PlotResult<Figure> {
    let mut kw = Kwargs::new(PlotKind::Line, kwargs);
    let common = kw.common()?;
    let palette = kw.palette()?;
    let shape = kw.params.take_string("line_shape")?.map(|s| line_shape(&s)).transpose()?;
    let mode = match kw.params.take_bool("markers")? {
        Some(true) => Mode::LinesMarkers,
        _ => Mode::Lines,
    };
    let hover = kw.hover_data(input.data, &["x", "y"])?;

    let form = WideForm::resolve(input)?;
    require_y(&form, PlotKind::Line)?;
    let mut fig = Figure::new();
    for (i, p) in form.placed(Orientation::Vertical).iter().enumerate() {
        let mut style = Line::new().color(palette.get(i).to_string()).dash(DashType::Solid);
        if let Some(shape) = &shape {
            style = style.shape(shape.clone());
        }
        let trace = Scatter::new(p.x(), p.y())
            .name(p.name.as_str())
            .legend_group(p.name.as_str())
            .show_legend(p.show_legend)
            .mode(mode.clone())
            .line(style)
            .marker(Marker::new().symbol(MarkerSymbol::Circle));
        fig.add_trace(p.finish(&trace)?);
    }
    fig.update_layout(&plotly_value(&form.layout(Orientation::Vertical))?);
    if let Some(hover) = hover {
        fig.update_traces(&hover);
    }
    kw.log_axes(&mut fig)?;
    kw.finish()?;
    common.apply(&mut fig, PlotKind::Line)?;
    Ok(fig)
}

pub fn scatter(input: &PlotInput<'_>, kwargs: &Map<String, Value>) -> PlotResult<Figure> {
    let mut kw = Kwargs::new(PlotKind::Scatter, kwargs);
    let common = kw.common()?;
    let palette = kw.palette()?;
    let opacity = kw.params.take_f64("opacity")?;
    let hover = kw.hover_data(input.data, &["x", "y"])?;

    let form = WideForm::resolve(input)?;
    require_y(&form, PlotKind::Scatter)?;
    let mut fig = Figure::new();
    for (i, p) in form.placed(Orientation::Vertical).iter().enumerate() {
        let mut marker = Marker::new()
            .color(palette.get(i).to_string())
            .symbol(MarkerSymbol::Circle);
        if let Some(opacity) = opacity {
            marker = marker.opacity(opacity);
        }
        let trace = Scatter::new(p.x(), p.y())
            .name(p.name.as_str())
            .legend_group(p.name.as_str())
            .show_legend(p.show_legend)
            .mode(Mode::Markers)
            .marker(marker);
        fig.add_trace(p.finish(&trace)?);
    }
    fig.update_layout(&plotly_value(&form.layout(Orientation::Vertical))?);
    if let Some(hover) = hover {
        fig.update_traces(&hover);
    }
    kw.log_axes(&mut fig)?;
    kw.finish()?;
    common.apply(&mut fig, PlotKind::Scatter)?;
    Ok(fig)
}

pub fn bar(input: &PlotInput<'_>, kwargs: &Map<String, Value>) -> PlotResult<Figure> {
    let mut kw = Kwargs::new(PlotKind::Bar, kwargs);
    let common = kw.common()?;
    let palette = kw.palette()?;
    let orientation = kw.orientation()?;
    let opacity = kw.params.take_f64("opacity")?;
    let text_auto = kw.params.take_bool("text_auto")?.unwrap_or(false);
    let hover = kw.hover_data(input.data, &["x", "y"])?;

    let form = WideForm::resolve(input)?;
    require_y(&form, PlotKind::Bar)?;
    let mut fig = Figure::new();
    for (i, p) in form.placed(orientation).iter().enumerate() {
        let mut marker = Marker::new().color(palette.get(i).to_string());
        if let Some(opacity) = opacity {
            marker = marker.opacity(opacity);
        }
        let trace = Bar::new(p.x(), p.y())
            .name(p.name.as_str())
            .legend_group(p.name.as_str())
            .show_legend(p.show_legend)
            .orientation(orientation.plotly())
            .marker(marker);
        let mut trace = p.finish(&trace)?;
        if text_auto {
            trace["texttemplate"] = json!("%{value}");
        }
        fig.add_trace(trace);
    }
    let layout = form.layout(orientation).bar_mode(BarMode::Relative);
    fig.update_layout(&plotly_value(&layout)?);
    if let Some(hover) = hover {
        fig.update_traces(&hover);
    }
    kw.log_axes(&mut fig)?;
    kw.finish()?;
    common.apply(&mut fig, PlotKind::Bar)?;
    Ok(fig)
}

pub fn box_plot(input: &PlotInput<'_>, kwargs: &Map<String, Value>) -> PlotResult<Figure> {
    let mut kw = Kwargs::new(PlotKind::Box, kwargs);
    let common = kw.common()?;
    let palette = kw.palette()?;
    let orientation = kw.orientation()?;
    let points = match kw.params.take("points") {
        None => None,
        Some(Value::Bool(false)) => Some(json!(false)),
        Some(Value::String(s)) if ["all", "outliers", "suspectedoutliers"].contains(&s.as_str()) => {
            Some(json!(s))
        }
        Some(other) => {
            return Err(PlotError::invalid(
                "points",
                format!("expected all, outliers, suspectedoutliers or false, got {}", other),
            ))
        }
    };
    let notched = kw.params.take_bool("notched")?;

    let form = WideForm::resolve(input)?;
    require_y(&form, PlotKind::Box)?;
    let mut fig = Figure::new();
    for (i, p) in form.placed(orientation).iter().enumerate() {
        let trace = BoxPlot::new_xy(p.x(), p.y())
            .name(p.name.as_str())
            .legend_group(p.name.as_str())
            .show_legend(p.show_legend)
            .orientation(orientation.plotly())
            .marker(Marker::new().color(palette.get(i).to_string()));
        let mut trace = p.finish(&trace)?;
        if let Some(points) = &points {
            trace["boxpoints"] = points.clone();
        }
        if let Some(notched) = notched {
            trace["notched"] = json!(notched);
        }
        fig.add_trace(trace);
    }
    let layout = form.layout(orientation).box_mode(BoxMode::Group);
    fig.update_layout(&plotly_value(&layout)?);
    kw.log_axes(&mut fig)?;
    kw.finish()?;
    common.apply(&mut fig, PlotKind::Box)?;
    Ok(fig)
}

pub fn histogram(input: &PlotInput<'_>, kwargs: &Map<String, Value>) -> PlotResult<Figure> {
    let mut kw = Kwargs::new(PlotKind::Hist, kwargs);
    let common = kw.common()?;
    let palette = kw.palette()?;
    let orientation = kw.orientation()?;
    let opacity = kw.params.take_f64("opacity")?;
    let nbins = kw.params.take_u32("nbins")?;
    let histnorm = kw.params.take_string("histnorm")?;
    let histfunc = kw.params.take_string("histfunc")?;
    let cumulative = kw.params.take_bool("cumulative")?;

    // Binned series and the optional aggregated series
    let (binned, weights) = match (&input.x, &input.y) {
        (Some(x), Some(y)) => (resolve(input.data, x)?, Some(resolve_one(input.data, y, "y")?)),
        (Some(x), None) => (resolve(input.data, x)?, None),
        (None, Some(y)) => (resolve(input.data, y)?, None),
        (None, None) => {
            let data = require_data(input.data, "histogram() without x or y")?;
            let names = data
                .columns
                .iter()
                .map(|c| c.label.to_string())
                .collect::<Vec<_>>();
            (resolve(Some(data), &Selector::Columns(names))?, None)
        }
    };
    let bins_on_y = input.x.is_none() && input.y.is_some();
    let bins_on_x = matches!(
        (bins_on_y, orientation),
        (false, Orientation::Vertical) | (true, Orientation::Horizontal)
    );

    let multi = binned.len() > 1;
    let mut fig = Figure::new();
    for (i, series) in binned.iter().enumerate() {
        let name = if multi { series.name.clone().unwrap_or_default() } else { String::new() };
        let values = series.values.clone();
        let trace = match (&weights, bins_on_x) {
            (Some(w), true) => Histogram::new_xy(values, w.values.clone()),
            (Some(w), false) => Histogram::new_xy(w.values.clone(), values),
            (None, true) => Histogram::new(values),
            (None, false) => Histogram::new_vertical(values),
        };
        let mut trace = trace
            .name(name.as_str())
            .legend_group(name.as_str())
            .show_legend(multi)
            .marker(Marker::new().color(palette.get(i).to_string()));
        if let Some(n) = nbins {
            trace = if bins_on_x { trace.n_bins_x(n as usize) } else { trace.n_bins_y(n as usize) };
        }
        if let Some(o) = opacity {
            trace = trace.opacity(o);
        }

        let mut trace = plotly_value(&trace)?;
        trace["bingroup"] = json!(if bins_on_x { "x" } else { "y" });
        if weights.is_some() {
            trace["histfunc"] = json!(histfunc.clone().unwrap_or_else(|| "sum".to_string()));
        } else if let Some(f) = &histfunc {
            trace["histfunc"] = json!(f);
        }
        if let Some(norm) = &histnorm {
            trace["histnorm"] = json!(norm);
        }
        if let Some(c) = cumulative {
            trace["cumulative"] = json!({"enabled": c});
        }
        fig.add_trace(trace);
    }

    let bin_title = if multi {
        Some("value".to_string())
    } else {
        binned.first().and_then(|s| s.name.clone())
    };
    let count_title = weights
        .as_ref()
        .and_then(|w| w.name.clone())
        .map(|n| format!("sum of {}", n))
        .unwrap_or_else(|| "count".to_string());
    let (x_title, y_title) = if bins_on_x {
        (bin_title, Some(count_title))
    } else {
        (Some(count_title), bin_title)
    };
    let mut legend = Legend::new().trace_group_gap(0);
    if multi {
        legend = legend.title(Title::from("variable"));
    }
    let layout = base_layout()
        .bar_mode(BarMode::Relative)
        .legend(legend)
        .x_axis(titled(Axis::new(), x_title))
        .y_axis(titled(Axis::new(), y_title));
    fig.update_layout(&plotly_value(&layout)?);
    kw.log_axes(&mut fig)?;
    kw.finish()?;
    common.apply(&mut fig, PlotKind::Hist)?;
    Ok(fig)
}

/// Heatmap of a matrix.
///
/// With a z selector the long columns x/y/z are pivoted first (rows = x,
/// columns = y); without one the table itself is the matrix.
pub fn imshow(input: &PlotInput<'_>, kwargs: &Map<String, Value>) -> PlotResult<Figure> {
    let mut kw = Kwargs::new(PlotKind::Imshow, kwargs);
    let common = kw.common()?;
    let colorscale = kw.params.take_string("color_continuous_scale")?;
    let zmin = kw.params.take_f64("zmin")?;
    let zmax = kw.params.take_f64("zmax")?;
    let aspect = kw.params.take_string("aspect")?;
    let text_auto = kw.params.take_bool("text_auto")?.unwrap_or(false);

    let data = require_data(input.data, "imshow()")?;
    let (cells, col_labels, row_labels, x_title, y_title) = match &input.z {
        Some(z) => {
            let x = require_column(&input.x, "x")?;
            let y = require_column(&input.y, "y")?;
            let grid = data.pivot(x, y, z)?;
            (grid.cells, grid.columns, grid.rows, Some(y.to_string()), Some(x.to_string()))
        }
        None => {
            let cells: Vec<Vec<Value>> = (0..data.nrows())
                .map(|r| data.columns.iter().map(|c| c.values[r].clone()).collect())
                .collect();
            let cols: Vec<Value> = data.columns.iter().map(|c| json!(c.label.to_string())).collect();
            (cells, cols, data.index.clone(), None, data.index_name.clone())
        }
    };

    let trace = HeatMap::new(col_labels, row_labels, cells).name("0");
    let mut trace = plotly_value(&trace)?;
    trace["coloraxis"] = json!("coloraxis");
    if text_auto {
        trace["texttemplate"] = json!("%{z}");
    }

    let mut fig = Figure::new();
    fig.add_trace(trace);

    let layout = base_layout()
        .x_axis(titled(Axis::new().anchor("y").domain(&[0.0, 1.0]), x_title))
        .y_axis(titled(Axis::new().anchor("x").domain(&[0.0, 1.0]), y_title));
    fig.update_layout(&plotly_value(&layout)?);

    let mut extra = json!({
        "xaxis": {"constrain": "domain"},
        "yaxis": {"autorange": "reversed", "constrain": "domain"},
        "coloraxis": {"colorscale": colorscale.unwrap_or_else(|| "Plasma".to_string())},
    });
    if let Some(t) = &input.z {
        extra["coloraxis"]["colorbar"] = json!({"title": {"text": t}});
    }
    if let Some(v) = zmin {
        extra["coloraxis"]["cmin"] = json!(v);
    }
    if let Some(v) = zmax {
        extra["coloraxis"]["cmax"] = json!(v);
    }
    match aspect.as_deref() {
        None | Some("equal") => extra["yaxis"]["scaleanchor"] = json!("x"),
        Some("auto") => {}
        Some(other) => {
            return Err(PlotError::invalid(
                "aspect",
                format!("expected 'equal' or 'auto', got '{}'", other),
            ))
        }
    }
    fig.update_layout(&extra);
    kw.finish()?;
    common.apply(&mut fig, PlotKind::Imshow)?;
    Ok(fig)
}

pub fn scatter_3d(input: &PlotInput<'_>, kwargs: &Map<String, Value>) -> PlotResult<Figure> {
    let mut kw = Kwargs::new(PlotKind::Scatter3d, kwargs);
    let common = kw.common()?;
    let palette = kw.palette()?;
    let opacity = kw.params.take_f64("opacity")?;
    let hover = kw.hover_data(input.data, &["x", "y", "z"])?;

    let z_name = input
        .z
        .as_ref()
        .ok_or_else(|| PlotError::TypeContract("scatter_3d() needs a z selector".to_string()))?;
    let axes = [
        ("x", input.x.as_ref()),
        ("y", input.y.as_ref()),
    ];
    let mut series = Vec::new();
    for (axis, sel) in axes {
        let sel = sel.ok_or_else(|| {
            PlotError::TypeContract(format!("scatter_3d() needs an {} selector", axis))
        })?;
        series.push(resolve_one(input.data, sel, axis)?);
    }
    series.push(resolve_one(input.data, &Selector::Column(z_name.clone()), "z")?);

    let n = series[0].values.len();
    if series.iter().any(|s| s.values.len() != n) {
        return Err(PlotError::InvalidData(
            "x, y and z must have the same length".to_string(),
        ));
    }

    let trace = Scatter3D::new(
        series[0].values.clone(),
        series[1].values.clone(),
        series[2].values.clone(),
    )
    .name("")
    .show_legend(false)
    .mode(Mode::Markers);
    let mut trace = plotly_value(&trace)?;
    trace["marker"] = json!({"color": palette.get(0), "symbol": "circle"});
    if let Some(o) = opacity {
        trace["marker"]["opacity"] = json!(o);
    }

    let mut fig = Figure::new();
    fig.add_trace(trace);

    let mut scene = json!({"domain": {"x": [0.0, 1.0], "y": [0.0, 1.0]}});
    for (axis, s) in ["xaxis", "yaxis", "zaxis"].iter().zip(&series) {
        if let Some(name) = &s.name {
            scene[*axis] = json!({"title": {"text": name}});
        }
    }
    fig.update_layout(&plotly_value(&base_layout())?);
    fig.update_layout(&json!({ "scene": scene }));
    if let Some(hover) = hover {
        fig.update_traces(&hover);
    }
    kw.finish()?;
    common.apply(&mut fig, PlotKind::Scatter3d)?;
    Ok(fig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnLabel};

    fn table() -> PlotData {
        PlotData::new(vec![
            Column::new(ColumnLabel::single("temp"), vec![json!(20.0), json!(21.0), json!(22.5)]),
            Column::new(ColumnLabel::single("pressure"), vec![json!(1.0), json!(1.1), json!(1.2)]),
        ])
        .unwrap()
    }

    fn wide(data: &PlotData) -> PlotInput<'_> {
        PlotInput {
            data: Some(data),
            x: Some(Selector::Index),
            y: Some(Selector::Columns(vec!["temp".into(), "pressure".into()])),
            z: None,
        }
    }

    #[test]
    fn test_line_wide_form() {
        let data = table();
        let fig = line(&wide(&data), &Map::new()).unwrap();
        assert_eq!(fig.data.len(), 2);
        assert_eq!(fig.data[0]["name"], json!("temp"));
        assert_eq!(fig.data[0]["x"], json!([0, 1, 2]));
        assert_eq!(fig.data[1]["y"], json!([1.0, 1.1, 1.2]));
        assert_eq!(fig.data[1]["line"]["color"], json!("#EF553B"));
        assert_eq!(fig.layout["xaxis"]["title"]["text"], json!("index"));
        assert_eq!(fig.layout["yaxis"]["title"]["text"], json!("value"));
        assert_eq!(fig.layout["legend"]["title"]["text"], json!("variable"));
    }

    #[test]
    fn test_line_keywords() {
        let data = table();
        let kwargs = json!({"line_shape": "hv", "markers": true, "log_y": true});
        let fig = line(&wide(&data), kwargs.as_object().unwrap()).unwrap();
        assert_eq!(fig.data[0]["line"]["shape"], json!("hv"));
        assert_eq!(fig.data[0]["mode"], json!("lines+markers"));
        assert_eq!(fig.layout["yaxis"]["type"], json!("log"));
    }

    #[test]
    fn test_unknown_keyword_rejected() {
        let data = table();
        let kwargs = json!({"mode": "markers"});
        let err = bar(&wide(&data), kwargs.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, PlotError::UnexpectedKeyword { kind, key } if kind == "bar" && key == "mode"));
    }

    #[test]
    fn test_single_column_hides_legend() {
        let data = table();
        let input = PlotInput {
            data: Some(&data),
            x: Some(Selector::Index),
            y: Some(Selector::Column("temp".into())),
            z: None,
        };
        let fig = scatter(&input, &Map::new()).unwrap();
        assert_eq!(fig.data.len(), 1);
        assert_eq!(fig.data[0]["showlegend"], json!(false));
        assert_eq!(fig.layout["yaxis"]["title"]["text"], json!("temp"));
    }

    #[test]
    fn test_raw_values_without_data() {
        let input = PlotInput {
            data: None,
            x: Some(Selector::Values(vec![json!(1), json!(2)])),
            y: Some(Selector::Values(vec![json!(3), json!(4)])),
            z: None,
        };
        let fig = line(&input, &Map::new()).unwrap();
        assert_eq!(fig.data[0]["x"], json!([1, 2]));
        assert!(fig.layout["xaxis"].get("title").is_none());
    }

    #[test]
    fn test_raw_labels_without_data() {
        let input = PlotInput {
            data: None,
            x: Some(Selector::Columns(vec!["Mon".into(), "Tue".into()])),
            y: Some(Selector::Values(vec![json!(1), json!(2)])),
            z: None,
        };
        let fig = bar(&input, &Map::new()).unwrap();
        assert_eq!(fig.data[0]["x"], json!(["Mon", "Tue"]));
        assert_eq!(fig.data[0]["y"], json!([1, 2]));
    }

    #[test]
    fn test_common_keywords() {
        let data = table();
        let kwargs = json!({
            "template": "plotly_white",
            "labels": {"index": "Sample", "value": "Reading"},
            "range_x": [0, 2],
            "range_y": [0, 30],
            "color_discrete_map": {"temp": "black"},
            "width": 500,
        });
        let fig = line(&wide(&data), kwargs.as_object().unwrap()).unwrap();
        assert!(fig.layout["template"].is_object());
        assert_eq!(fig.layout["xaxis"]["title"]["text"], json!("Sample"));
        assert_eq!(fig.layout["yaxis"]["title"]["text"], json!("Reading"));
        assert_eq!(fig.layout["xaxis"]["range"], json!([0, 2]));
        assert_eq!(fig.layout["yaxis"]["range"], json!([0, 30]));
        assert_eq!(fig.layout["width"], json!(500));
        assert_eq!(fig.data[0]["line"]["color"], json!("black"));
        assert_eq!(fig.data[0]["marker"]["color"], json!("black"));
        assert_eq!(fig.data[1]["line"]["color"], json!("#EF553B"));
    }

    #[test]
    fn test_unknown_template_rejected() {
        let data = table();
        let kwargs = json!({"template": "ggplot9"});
        let err = scatter(&wide(&data), kwargs.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, PlotError::InvalidParameter { .. }));
    }

    #[test]
    fn test_hover_data_columns() {
        let data = table();
        let input = PlotInput {
            data: Some(&data),
            x: Some(Selector::Index),
            y: Some(Selector::Column("temp".into())),
            z: None,
        };
        let kwargs = json!({"hover_data": ["pressure"]});
        let fig = scatter(&input, kwargs.as_object().unwrap()).unwrap();
        assert_eq!(fig.data[0]["customdata"], json!([[1.0], [1.1], [1.2]]));
        let template = fig.data[0]["hovertemplate"].as_str().unwrap();
        assert!(template.contains("pressure=%{customdata[0]}"));

        let kwargs = json!({"hover_data": ["humidity"]});
        assert!(scatter(&input, kwargs.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_line_shape_validated() {
        let data = table();
        let kwargs = json!({"line_shape": "zigzag"});
        assert!(line(&wide(&data), kwargs.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let input = PlotInput {
            data: None,
            x: Some(Selector::Values(vec![json!(1)])),
            y: Some(Selector::Values(vec![json!(3), json!(4)])),
            z: None,
        };
        assert!(matches!(line(&input, &Map::new()), Err(PlotError::InvalidData(_))));
    }

    #[test]
    fn test_missing_column() {
        let data = table();
        let input = PlotInput {
            data: Some(&data),
            x: Some(Selector::Column("time".into())),
            y: Some(Selector::Column("temp".into())),
            z: None,
        };
        assert!(matches!(line(&input, &Map::new()), Err(PlotError::ColumnNotFound(c)) if c == "time"));
    }

    #[test]
    fn test_horizontal_bar_swaps_axes() {
        let data = table();
        let kwargs = json!({"orientation": "h"});
        let fig = bar(&wide(&data), kwargs.as_object().unwrap()).unwrap();
        assert_eq!(fig.data[0]["orientation"], json!("h"));
        assert_eq!(fig.data[0]["y"], json!([0, 1, 2]));
        assert_eq!(fig.layout["yaxis"]["title"]["text"], json!("index"));
    }

    #[test]
    fn test_box_points() {
        let data = table();
        let kwargs = json!({"points": "all", "notched": true});
        let fig = box_plot(&wide(&data), kwargs.as_object().unwrap()).unwrap();
        assert_eq!(fig.data[0]["type"], json!("box"));
        assert_eq!(fig.data[0]["boxpoints"], json!("all"));
        assert_eq!(fig.data[1]["notched"], json!(true));

        let kwargs = json!({"points": "some"});
        assert!(box_plot(&wide(&data), kwargs.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_histogram_of_all_columns() {
        let data = table();
        let input = PlotInput { data: Some(&data), x: None, y: None, z: None };
        let kwargs = json!({"nbins": 10, "histnorm": "percent"});
        let fig = histogram(&input, kwargs.as_object().unwrap()).unwrap();
        assert_eq!(fig.data.len(), 2);
        assert_eq!(fig.data[0]["x"], json!([20.0, 21.0, 22.5]));
        assert_eq!(fig.data[0]["nbinsx"], json!(10));
        assert_eq!(fig.data[1]["histnorm"], json!("percent"));
        assert_eq!(fig.layout["yaxis"]["title"]["text"], json!("count"));
    }

    #[test]
    fn test_histogram_with_weights() {
        let data = table();
        let input = PlotInput {
            data: Some(&data),
            x: Some(Selector::Column("temp".into())),
            y: Some(Selector::Column("pressure".into())),
            z: None,
        };
        let fig = histogram(&input, &Map::new()).unwrap();
        assert_eq!(fig.data[0]["histfunc"], json!("sum"));
        assert_eq!(fig.layout["yaxis"]["title"]["text"], json!("sum of pressure"));
    }

    #[test]
    fn test_imshow_pivot() {
        let data = PlotData::new(vec![
            Column::new(ColumnLabel::single("x"), vec![json!(0), json!(0), json!(1), json!(1)]),
            Column::new(ColumnLabel::single("y"), vec![json!(0), json!(1), json!(0), json!(1)]),
            Column::new(ColumnLabel::single("z"), vec![json!(1), json!(2), json!(3), json!(4)]),
        ])
        .unwrap();
        let input = PlotInput {
            data: Some(&data),
            x: Some(Selector::Column("x".into())),
            y: Some(Selector::Column("y".into())),
            z: Some("z".into()),
        };
        let fig = imshow(&input, &Map::new()).unwrap();
        assert_eq!(fig.data[0]["type"], json!("heatmap"));
        assert_eq!(fig.data[0]["z"], json!([[1, 2], [3, 4]]));
        assert_eq!(fig.layout["xaxis"]["title"]["text"], json!("y"));
        assert_eq!(fig.layout["yaxis"]["title"]["text"], json!("x"));
        assert_eq!(fig.layout["coloraxis"]["colorbar"]["title"]["text"], json!("z"));
    }

    #[test]
    fn test_imshow_table_matrix() {
        let data = table();
        let input = PlotInput { data: Some(&data), x: None, y: None, z: None };
        let fig = imshow(&input, &Map::new()).unwrap();
        assert_eq!(fig.data[0]["z"][2], json!([22.5, 1.2]));
        assert_eq!(fig.data[0]["x"], json!(["temp", "pressure"]));
    }

    #[test]
    fn test_scatter_3d() {
        let data = PlotData::new(vec![
            Column::new(ColumnLabel::single("a"), vec![json!(1)]),
            Column::new(ColumnLabel::single("b"), vec![json!(2)]),
            Column::new(ColumnLabel::single("c"), vec![json!(3)]),
        ])
        .unwrap();
        let input = PlotInput {
            data: Some(&data),
            x: Some(Selector::Column("a".into())),
            y: Some(Selector::Column("b".into())),
            z: Some("c".into()),
        };
        let fig = scatter_3d(&input, &Map::new()).unwrap();
        assert_eq!(fig.data[0]["type"], json!("scatter3d"));
        assert_eq!(fig.data[0]["z"], json!([3]));
        assert_eq!(fig.layout["scene"]["zaxis"]["title"]["text"], json!("c"));

        let kwargs = json!({"range_x": [0, 5], "labels": {"c": "depth"}});
        let fig = scatter_3d(&input, kwargs.as_object().unwrap()).unwrap();
        assert_eq!(fig.layout["scene"]["xaxis"]["range"], json!([0, 5]));
        assert_eq!(fig.layout["scene"]["xaxis"]["title"]["text"], json!("a"));
        assert_eq!(fig.layout["scene"]["zaxis"]["title"]["text"], json!("depth"));
    }

    #[test]
    fn test_select_covers_every_kind() {
        let data = table();
        let input = wide(&data);
        for kind in [PlotKind::Line, PlotKind::Scatter, PlotKind::Bar, PlotKind::Box] {
            let fig = select(kind)(&input, &Map::new()).unwrap();
            assert_eq!(fig.data.len(), 2, "{}", kind);
        }
        let input = PlotInput { x: None, ..wide(&data) };
        let fig = select(PlotKind::Hist)(&input, &Map::new()).unwrap();
        assert_eq!(fig.data[1]["y"], json!([1.0, 1.1, 1.2]));
    }
}

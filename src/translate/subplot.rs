// Subplot translation: per-subplot trace and y-axis styles, shared x-axis

use super::{
    alias_line_shape, apply_sizing, as_f64, as_range, as_text, legend_style, AxisRange,
    AxisStyle, BorderStyle, LayoutStyle, LineStyle, MarkerStyle, Params, Title, TraceStyle,
};
use crate::error::{PlotError, PlotResult};
use log::{debug, warn};
use serde_json::{Map, Value};

/// Output of [`translate_subplots`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubplotStyle {
    /// One trace style per subplot
    pub traces: Vec<TraceStyle>,
    pub layout: LayoutStyle,
    /// Shared x-axis (bottom row)
    pub x_axis: AxisStyle,
    /// One y-axis style per subplot
    pub y_axes: Vec<AxisStyle>,
    /// Options with no effect in subplot mode
    pub ignored: Map<String, Value>,
}

/// Stretch a per-subplot list to `n` entries.
///
/// A single value is repeated, a shorter list is cycled and truncated, a list
/// already covering `n` subplots is returned unchanged.
pub fn broadcast<T: Clone>(values: Vec<T>, n: usize) -> Vec<T> {
    if values.is_empty() || values.len() >= n {
        return values;
    }
    values.iter().cycle().take(n).cloned().collect()
}

/// Take an option as a per-subplot list, broadcast to `n` entries
fn take_series<T: Clone>(
    p: &mut Params,
    key: &str,
    n: usize,
    convert: impl Fn(&str, &Value) -> PlotResult<T>,
) -> PlotResult<Option<Vec<T>>> {
    let items = match p.take(key) {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(scalar) => vec![scalar],
    };
    series_from(key, items, n, convert).map(Some)
}

/// Ranges are pairs themselves: a flat pair is one range for every subplot
fn take_range_series(p: &mut Params, key: &str, n: usize) -> PlotResult<Option<Vec<AxisRange>>> {
    let value = match p.take(key) {
        None => return Ok(None),
        Some(v) => v,
    };
    let items = match value {
        Value::Array(items) if items.iter().any(Value::is_array) => items,
        single => vec![single],
    };
    series_from(key, items, n, as_range).map(Some)
}

fn series_from<T: Clone>(
    key: &str,
    items: Vec<Value>,
    n: usize,
    convert: impl Fn(&str, &Value) -> PlotResult<T>,
) -> PlotResult<Vec<T>> {
    if items.is_empty() {
        return Err(PlotError::invalid(key, "expected at least one value"));
    }
    let converted = items
        .iter()
        .map(|v| convert(key, v))
        .collect::<PlotResult<Vec<T>>>()?;
    Ok(broadcast(converted, n))
}

fn nth<T: Clone>(series: &Option<Vec<T>>, i: usize) -> Option<T> {
    series.as_ref().and_then(|s| s.get(i)).cloned()
}

/// Translate the caller's options for a grid of `n_subplots` stacked plots.
pub fn translate_subplots(params: &Map<String, Value>, n_subplots: usize) -> PlotResult<SubplotStyle> {
    let mut p = Params::new(params);
    let n = n_subplots;

    // Traces
    let mode = take_series(&mut p, "mode", n, as_text)?;
    let line_color = take_series(&mut p, "line_color", n, as_text)?;
    let line_style = take_series(&mut p, "line_style", n, as_text)?;
    let line_width = take_series(&mut p, "line_width", n, as_f64)?;
    let marker_color = take_series(&mut p, "marker_color", n, as_text)?;
    let marker_size = take_series(&mut p, "marker_size", n, as_f64)?;
    let marker_alpha = take_series(&mut p, "marker_alpha", n, as_f64)?;
    let line_shape = take_series(&mut p, "line_shape", n, as_text)?;

    let traces = (0..n)
        .map(|i| TraceStyle {
            mode: nth(&mode, i),
            line: LineStyle {
                dash: nth(&line_style, i),
                color: nth(&line_color, i),
                width: nth(&line_width, i),
                shape: nth(&line_shape, i).map(|s| alias_line_shape(&s).to_string()),
            },
            marker: MarkerStyle {
                color: nth(&marker_color, i),
                size: nth(&marker_size, i),
                opacity: nth(&marker_alpha, i),
            },
            quartilemethod: None,
        })
        .collect();

    // Layout
    let mut layout = LayoutStyle::default();
    apply_sizing(&mut p, &mut layout)?;
    layout.title = p.take_string("title")?.map(Title::new);
    layout.legend = legend_style(&mut p)?;

    // Axes
    let border = p.take_bool("borders")?.map(BorderStyle::new);
    let x_axis = AxisStyle {
        title: p.take_string("xlabel")?.map(Title::new),
        range: p.take_range("xlim")?,
        exponentformat: None,
        border: border.clone(),
    };

    let ylabel = take_series(&mut p, "ylabel", n, as_text)?;
    let ylim = take_range_series(&mut p, "ylim", n)?;
    let y_axes = (0..n)
        .map(|i| AxisStyle {
            title: nth(&ylabel, i).map(Title::new),
            range: nth(&ylim, i),
            exponentformat: None,
            border: border.clone(),
        })
        .collect();

    let ignored = p.into_map();
    for key in ignored.keys() {
        warn!("Option '{}' has no effect in subplot mode", key);
    }
    debug!("Translated {} options for {} subplots", params.len(), n);

    Ok(SubplotStyle {
        traces,
        layout,
        x_axis,
        y_axes,
        ignored,
    })
}

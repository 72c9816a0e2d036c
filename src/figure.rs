//! Plotly-compatible figure model.
//!
//! A figure is the pair of `data` (list of trace objects) and `layout`, the
//! same structure plotly.js consumes. All `update_*` methods merge a JSON
//! patch recursively:
//!
//! ```text
//! object + object  -> merged key by key
//! anything + null  -> key removed
//! anything + other -> replaced
//! ```
//!
//! Primitives build their traces and base layout with the typed `plotly`
//! builders and store them here as JSON; pages are rendered through a
//! `plotly::Plot`.

use crate::error::{PlotError, PlotResult};
use log::info;
use plotly::{Layout, Plot, Trace};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Map<String, Value>,
}

impl Figure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertically stacked grid with one column and a shared x-axis.
    ///
    /// Row 1 is on top. Every x-axis except the bottom one follows the
    /// bottom axis and hides its tick labels.
    pub fn stacked(rows: usize, titles: &[String]) -> Self {
        let mut fig = Figure::new();
        if rows == 0 {
            return fig;
        }

        let spacing = 0.3 / rows as f64;
        let height = (1.0 - spacing * (rows - 1) as f64) / rows as f64;
        let bottom_ref = axis_ref('x', rows);

        let mut annotations = Vec::new();
        for row in 1..=rows {
            let top = 1.0 - (row - 1) as f64 * (height + spacing);
            let bottom = (top - height).max(0.0);

            let mut xaxis = json!({
                "anchor": axis_ref('y', row),
                "domain": [0.0, 1.0],
            });
            if row != rows {
                xaxis["matches"] = json!(bottom_ref);
                xaxis["showticklabels"] = json!(false);
            }
            fig.layout.insert(axis_key('x', row), xaxis);
            fig.layout.insert(
                axis_key('y', row),
                json!({
                    "anchor": axis_ref('x', row),
                    "domain": [bottom, top],
                }),
            );

            if let Some(title) = titles.get(row - 1) {
                annotations.push(json!({
                    "text": title,
                    "showarrow": false,
                    "font": {"size": 16},
                    "x": 0.5,
                    "xanchor": "center",
                    "xref": "paper",
                    "y": top,
                    "yanchor": "bottom",
                    "yref": "paper",
                }));
            }
        }
        if !annotations.is_empty() {
            fig.layout.insert("annotations".to_string(), Value::Array(annotations));
        }
        fig
    }

    pub fn add_trace(&mut self, trace: Value) {
        self.data.push(trace);
    }

    /// Add a trace bound to the axes of a grid row (1-based)
    pub fn add_trace_at(&mut self, mut trace: Value, row: usize) {
        if let Value::Object(obj) = &mut trace {
            obj.insert("xaxis".to_string(), json!(axis_ref('x', row)));
            obj.insert("yaxis".to_string(), json!(axis_ref('y', row)));
        }
        self.data.push(trace);
    }

    pub fn update_traces(&mut self, patch: &Value) {
        for trace in &mut self.data {
            merge_value(trace, patch);
        }
    }

    pub fn update_layout(&mut self, patch: &Value) {
        if let Value::Object(entries) = patch {
            merge_map(&mut self.layout, entries);
        }
    }

    /// Update one x-axis (grid row) or, with `None`, every x-axis in the layout
    pub fn update_xaxes(&mut self, patch: &Value, row: Option<usize>) {
        self.update_axes('x', patch, row);
    }

    pub fn update_yaxes(&mut self, patch: &Value, row: Option<usize>) {
        self.update_axes('y', patch, row);
    }

    fn update_axes(&mut self, letter: char, patch: &Value, row: Option<usize>) {
        let keys: Vec<String> = match row {
            Some(r) => vec![axis_key(letter, r)],
            None => {
                let mut keys: Vec<String> = self
                    .layout
                    .keys()
                    .filter(|k| is_axis_key(k, letter))
                    .cloned()
                    .collect();
                if keys.is_empty() {
                    keys.push(axis_key(letter, 1));
                }
                keys
            }
        };
        for key in keys {
            let axis = self
                .layout
                .entry(key)
                .or_insert_with(|| Value::Object(Map::new()));
            merge_value(axis, patch);
        }
    }

    pub fn to_json(&self) -> PlotResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The traces as a `plotly::Plot`, without the layout
    pub fn to_plot(&self) -> Plot {
        let mut plot = Plot::new();
        for trace in &self.data {
            plot.add_trace(Box::new(PatchedTrace(trace.clone())));
        }
        plot
    }

    /// Standalone HTML page rendered by `plotly`.
    ///
    /// The merged layout is a free-form map, so it takes the place of the
    /// plot's empty typed layout in the embedded figure JSON.
    pub fn to_html(&self) -> PlotResult<String> {
        let html = self.to_plot().to_html();
        let slot = format!("\"layout\":{}", serde_json::to_string(&Layout::new())?);
        if !html.contains(&slot) {
            return Err(PlotError::InvalidData(
                "rendered page has no layout to replace".to_string(),
            ));
        }
        let layout = format!("\"layout\":{}", serde_json::to_string(&self.layout)?);
        Ok(html.replacen(&slot, &layout, 1))
    }

    pub fn write_html(&self, path: &Path) -> PlotResult<()> {
        fs::write(path, self.to_html()?)?;
        Ok(())
    }

    /// Display the figure by writing it to a temporary HTML page.
    pub fn show(&self) -> PlotResult<PathBuf> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("tcplot-{}-{}.html", std::process::id(), n));
        self.write_html(&path)?;
        info!("Figure written to {}", path.display());
        Ok(path)
    }
}

/// A trace already in plotly.js JSON form, after patching
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
struct PatchedTrace(Value);

impl Trace for PatchedTrace {
    fn to_json(&self) -> String {
        self.0.to_string()
    }
}

/// JSON form of a typed `plotly` trace or layout
pub(crate) fn plotly_value<T: Serialize>(item: &T) -> PlotResult<Value> {
    Ok(serde_json::to_value(item)?)
}

/// Layout key of the axis for a grid row: `xaxis`, `xaxis2`, ...
pub fn axis_key(letter: char, row: usize) -> String {
    if row <= 1 {
        format!("{}axis", letter)
    } else {
        format!("{}axis{}", letter, row)
    }
}

/// Trace-side reference to the axis for a grid row: `x`, `x2`, ...
pub fn axis_ref(letter: char, row: usize) -> String {
    if row <= 1 {
        letter.to_string()
    } else {
        format!("{}{}", letter, row)
    }
}

fn is_axis_key(key: &str, letter: char) -> bool {
    key.strip_prefix(letter)
        .and_then(|rest| rest.strip_prefix("axis"))
        .map(|n| n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Recursively merge `patch` into `target`
pub fn merge_value(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(t), Value::Object(p)) => merge_map(t, p),
        (t, p) => *t = p.clone(),
    }
}

fn merge_map(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
            continue;
        }
        let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
        match target.get_mut(key) {
            Some(existing) if nested => merge_value(existing, value),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

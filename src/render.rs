//! Plot dispatcher: selects the primitive, applies translated styling and
//! logo overlays, and optionally shows the result.

use crate::data::PlotData;
use crate::error::{PlotError, PlotResult};
use crate::express::{self, PlotInput, Selector};
use crate::figure::{merge_value, plotly_value, Figure};
use crate::logo::resolve_logos;
use crate::subplot::{calc_subplots, SubplotGroup};
use crate::translate::{to_patch, translate, translate_subplots};
use crate::{PlotKind, PlotOptions};
use log::{debug, info};
use plotly::Scatter;
use serde_json::{json, Value};

/// Build a figure from an optional table and plot options.
///
/// With data and no selectors, x defaults to the table index and y to every
/// column (except for histograms, which bin all columns on their own).
/// Without data both x and y must be given as raw values.
pub fn render(data: Option<&PlotData>, options: &PlotOptions) -> PlotResult<Figure> {
    info!(
        "Rendering {} plot{}",
        options.kind,
        if options.subplots { " with subplots" } else { "" }
    );

    let mut fig = if options.subplots {
        let data = data.ok_or_else(|| {
            PlotError::TypeContract("Subplots require data".to_string())
        })?;
        render_subplots(data, options)?
    } else {
        render_single(data, options)?
    };

    let images = resolve_logos(options.main_logo.as_deref(), options.proj_logo.as_deref())?;
    if !images.is_empty() {
        debug!("Adding {} logo overlay(s)", images.len());
    }
    fig.update_layout(&json!({ "images": images }));

    if options.show {
        fig.show()?;
    }
    Ok(fig)
}

/// Fill in default selectors for the given table
fn default_selectors(
    data: Option<&PlotData>,
    options: &PlotOptions,
) -> PlotResult<(Option<Selector>, Option<Selector>)> {
    let mut x = options.x.clone();
    let mut y = options.y.clone();
    match data {
        Some(data) if options.kind != PlotKind::Hist => {
            if x.is_none() {
                x = Some(Selector::Index);
            }
            if y.is_none() && !data.is_multi_level() {
                let names = data
                    .columns
                    .iter()
                    .map(|c| c.label.to_string())
                    .filter(|name| !matches!(&x, Some(Selector::Column(col)) if col == name))
                    .collect();
                y = Some(Selector::Columns(names));
            }
        }
        Some(_) => {}
        None => {
            if x.is_none() || y.is_none() {
                return Err(PlotError::TypeContract(
                    "Both x and y must be specified if data is None".to_string(),
                ));
            }
        }
    }
    Ok((x, y))
}

fn render_single(data: Option<&PlotData>, options: &PlotOptions) -> PlotResult<Figure> {
    if data.is_some_and(PlotData::is_multi_level) {
        return Err(PlotError::TypeContract(
            "MultiIndex only supported in subplots".to_string(),
        ));
    }
    let kind = options.kind;
    let style = translate(&options.params, kind)?;

    if options.z.is_some() && !matches!(kind, PlotKind::Imshow | PlotKind::Scatter3d) {
        return Err(PlotError::NotImplemented(kind.to_string()));
    }

    let (x, y) = if kind == PlotKind::Imshow && options.z.is_none() {
        (options.x.clone(), options.y.clone())
    } else {
        default_selectors(data, options)?
    };
    let input = PlotInput {
        data,
        x,
        y,
        z: options.z.clone(),
    };

    let mut fig = express::select(kind)(&input, &style.plot_kwargs)?;
    if kind != PlotKind::Imshow {
        fig.update_traces(&to_patch(&style.trace)?);
    }
    fig.update_layout(&to_patch(&style.layout)?);
    Ok(fig)
}

/// Resolve the shared x values of the subplot grid
fn subplot_x(data: &PlotData, x: Option<&Selector>) -> PlotResult<Vec<Value>> {
    match x {
        None | Some(Selector::Index) => Ok(data.index.clone()),
        Some(Selector::Column(name)) => Ok(data.column(name)?.values.clone()),
        Some(Selector::Values(values)) => {
            if values.len() != data.nrows() {
                return Err(PlotError::InvalidData(format!(
                    "x has {} values but the table has {} rows",
                    values.len(),
                    data.nrows()
                )));
            }
            Ok(values.clone())
        }
        Some(Selector::Columns(_)) => Err(PlotError::invalid("x", "expected a single column")),
    }
}

fn render_subplots(data: &PlotData, options: &PlotOptions) -> PlotResult<Figure> {
    let exclude = match &options.x {
        Some(Selector::Column(name)) => Some(name.as_str()),
        _ => None,
    };
    let groups = calc_subplots(data, exclude);
    let n = groups.len();
    let style = translate_subplots(&options.params, n)?;
    let xs = subplot_x(data, options.x.as_ref())?;
    let multi = data.is_multi_level();

    let titles: Vec<String> = groups.iter().map(SubplotGroup::title).collect();
    let mut fig = Figure::stacked(n, &titles);
    debug!("Stacked {} subplots: {:?}", n, titles);

    for (i, group) in groups.iter().enumerate() {
        let row = i + 1;
        let trace_patch = to_patch(&style.traces[i])?;
        for label in &group.columns {
            let column = data
                .columns
                .iter()
                .find(|c| &c.label == label)
                .ok_or_else(|| PlotError::ColumnNotFound(label.to_string()))?;
            let name = if multi { label.to_string() } else { label.leaf().to_string() };
            let trace = Scatter::new(xs.clone(), column.values.clone())
                .name(name.as_str())
                .show_legend(multi);
            let mut trace = plotly_value(&trace)?;
            merge_value(&mut trace, &trace_patch);
            fig.add_trace_at(trace, row);
        }
        fig.update_yaxes(&to_patch(&style.y_axes[i])?, Some(row));
    }

    fig.update_xaxes(&to_patch(&style.x_axis)?, Some(n));
    if let Some(border) = &style.x_axis.border {
        fig.update_xaxes(&to_patch(border)?, None);
    }
    fig.update_layout(&to_patch(&style.layout)?);
    Ok(fig)
}

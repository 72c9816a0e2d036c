// Single-plot translation: one trace patch and one layout patch for the figure

use super::{
    alias_line_shape, apply_sizing, legend_style, AxisStyle, BorderStyle, ColorAxisStyle,
    ColorBar, LayoutStyle, LineStyle, MarkerStyle, Params, SceneAxis, SceneStyle, Title,
    TraceStyle,
};
use crate::error::PlotResult;
use crate::PlotKind;
use log::debug;
use serde_json::{Map, Value};

/// Output of [`translate`]
#[derive(Debug, Clone, PartialEq)]
pub struct SinglePlotStyle {
    pub trace: TraceStyle,
    pub layout: LayoutStyle,
    /// Options not recognised here, forwarded to the plot primitive
    pub plot_kwargs: Map<String, Value>,
}

/// Split the caller's options into trace style, layout style and the
/// keywords left for the plot primitive.
pub fn translate(params: &Map<String, Value>, kind: PlotKind) -> PlotResult<SinglePlotStyle> {
    let mut p = Params::new(params);

    // Traces
    let mut trace = TraceStyle::default();
    if kind == PlotKind::Line {
        trace.mode = p.take_string("mode")?;
        trace.line = LineStyle {
            dash: Some(p.take_string("line_style")?.unwrap_or_else(|| "solid".to_string())),
            color: p.take_string("line_color")?,
            width: p.take_f64("line_width")?,
            shape: None,
        };
    }
    if matches!(kind, PlotKind::Line | PlotKind::Scatter) {
        trace.marker = MarkerStyle {
            color: p.take_string("marker_color")?,
            size: p.take_f64("marker_size")?,
            opacity: p.take_f64("marker_alpha")?,
        };
    }
    if kind == PlotKind::Box {
        trace.quartilemethod =
            Some(p.take_string("quartilemethod")?.unwrap_or_else(|| "linear".to_string()));
    }

    // Layout
    let mut layout = LayoutStyle {
        title: p.take_string("title")?.map(Title::new),
        ..Default::default()
    };
    let mut xaxis = AxisStyle::default();
    let mut yaxis = AxisStyle::default();

    if kind != PlotKind::Scatter3d {
        xaxis.title = p.take_string("xlabel")?.map(Title::new);
        yaxis.title = p.take_string("ylabel")?.map(Title::new);
    } else {
        layout.scene = Some(SceneStyle {
            xaxis: SceneAxis { title: p.take_string("xlabel")?.map(Title::new) },
            yaxis: SceneAxis { title: p.take_string("ylabel")?.map(Title::new) },
            zaxis: SceneAxis { title: p.take_string("zlabel")?.map(Title::new) },
        });
    }

    xaxis.range = p.take_range("xlim")?;
    yaxis.range = p.take_range("ylim")?;

    let exponent = p
        .take_string("exponent_format")?
        .unwrap_or_else(|| "power".to_string());
    xaxis.exponentformat = Some(exponent.clone());
    yaxis.exponentformat = Some(exponent);

    if let Some(show) = p.take_bool("borders")? {
        xaxis.border = Some(BorderStyle::new(show));
        yaxis.border = Some(BorderStyle::new(show));
    }
    layout.xaxis = xaxis;
    layout.yaxis = yaxis;

    apply_sizing(&mut p, &mut layout)?;

    layout.coloraxis = p.take_string("colorbar_title")?.map(|text| ColorAxisStyle {
        colorbar: ColorBar { title: Title::new(text) },
    });
    layout.barmode = Some(p.take_string("barmode")?.unwrap_or_else(|| "overlay".to_string()));
    layout.legend = legend_style(&mut p)?;

    // Plot keywords
    if kind == PlotKind::Line {
        p.rewrite("line_shape", |shape| alias_line_shape(shape).to_string());
    }

    let plot_kwargs = p.into_map();
    debug!(
        "Translated {} options for {} plot, forwarding {:?}",
        params.len(),
        kind,
        plot_kwargs.keys().collect::<Vec<_>>()
    );

    Ok(SinglePlotStyle {
        trace,
        layout,
        plot_kwargs,
    })
}

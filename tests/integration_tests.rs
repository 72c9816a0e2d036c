use serde_json::{json, Map, Value};
use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};
use tcplot::{render, CsvLayout, PlotData, PlotError, PlotKind, PlotOptions, Selector};

/// Helper function to run tcplot with arguments and stdin input
fn run_tcplot(args: &[&str], input: &str) -> Result<String, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tcplot"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(|e| format!("Failed to write to stdin: {}", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

fn run_json(args: &[&str], input: &str) -> Value {
    let out = run_tcplot(args, input).unwrap_or_else(|e| panic!("tcplot failed: {}", e));
    serde_json::from_str(&out).expect("Output is not valid JSON")
}

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("test/{}", name)).expect("Failed to read test CSV")
}

fn load(name: &str, header_rows: usize, index_col: Option<usize>) -> PlotData {
    let layout = CsvLayout { header_rows, index_col };
    PlotData::from_csv(fixture(name).as_bytes(), &layout).expect("Failed to parse test CSV")
}

fn options(kind: PlotKind, params: Value) -> PlotOptions {
    let params: Map<String, Value> = params.as_object().cloned().unwrap_or_default();
    PlotOptions {
        kind,
        show: false,
        params,
        ..Default::default()
    }
}

// =============================================================================
// Library
// =============================================================================

#[test]
fn test_default_line_plot() {
    let data = PlotData::new(vec![
        tcplot::Column::new(tcplot::ColumnLabel::single("temp"), vec![json!(20), json!(21)]),
        tcplot::Column::new(tcplot::ColumnLabel::single("pressure"), vec![json!(1), json!(2)]),
    ])
    .unwrap();
    let fig = render(Some(&data), &options(PlotKind::Line, json!({}))).unwrap();
    assert_eq!(fig.data.len(), 2);
    for trace in &fig.data {
        assert_eq!(trace["x"], json!([0, 1]));
    }
}

#[test]
fn test_missing_data_and_x_is_contract_failure() {
    let mut opts = options(PlotKind::Line, json!({}));
    opts.y = Some(Selector::Values(vec![json!(1), json!(2), json!(3)]));
    let err = render(None, &opts).unwrap_err();
    assert!(matches!(err, PlotError::TypeContract(_)));
}

#[test]
fn test_imshow_pivots_long_table() {
    let data = load("grid.csv", 1, None);
    let mut opts = options(PlotKind::Imshow, json!({"title": "Grid"}));
    opts.x = Some(Selector::Column("row".into()));
    opts.y = Some(Selector::Column("col".into()));
    opts.z = Some("value".into());
    let fig = render(Some(&data), &opts).unwrap();
    assert_eq!(fig.data[0]["type"], json!("heatmap"));
    assert_eq!(fig.data[0]["z"], json!([[1.5, 2.5], [3.5, 4.5]]));
    assert_eq!(fig.layout["title"]["text"], json!("Grid"));
}

#[test]
fn test_styled_single_plot() {
    let data = load("timeseries.csv", 1, Some(0));
    let opts = options(
        PlotKind::Line,
        json!({
            "title": "Loop", "xlabel": "t [s]", "size": "large", "width": 300,
            "legend_location": "innerNW", "borders": true, "line_shape": "steps-mid",
            "line_color": "black"
        }),
    );
    let before = opts.params.clone();
    let fig = render(Some(&data), &opts).unwrap();
    assert_eq!(opts.params, before);

    assert_eq!(fig.data[0]["x"], json!([0.0, 0.5, 1.0, 1.5, 2.0]));
    assert_eq!(fig.data[0]["line"]["shape"], json!("hvh"));
    assert_eq!(fig.data[1]["line"]["color"], json!("black"));
    assert_eq!(fig.layout["width"], json!(1600));
    assert_eq!(fig.layout["height"], json!(1000));
    assert_eq!(fig.layout["legend"]["x"], json!(0.01));
    assert_eq!(fig.layout["legend"]["yanchor"], json!("top"));
    assert_eq!(fig.layout["xaxis"]["title"]["text"], json!("t [s]"));
    assert_eq!(fig.layout["yaxis"]["linecolor"], json!("#06476a"));
}

#[test]
fn test_multi_level_subplots_from_csv() {
    let data = load("multilevel.csv", 2, Some(0));
    assert!(data.is_multi_level());
    let mut opts = options(PlotKind::Line, json!({"ylabel": ["T [K]", "T [K]"], "mode": "lines"}));
    opts.subplots = true;
    let fig = render(Some(&data), &opts).unwrap();

    assert_eq!(fig.data.len(), 3);
    let names: Vec<&Value> = fig.data.iter().map(|t| &t["name"]).collect();
    assert_eq!(names, vec!["(loop1, T)", "(loop1, p)", "(loop2, T)"]);
    assert_eq!(fig.data[2]["yaxis"], json!("y2"));
    assert_eq!(fig.data[0]["x"], json!([0.0, 1.0, 2.0]));
    assert_eq!(fig.layout["annotations"][1]["text"], json!("loop2"));
    assert_eq!(fig.layout["yaxis2"]["title"]["text"], json!("T [K]"));
}

#[test]
fn test_multi_level_without_subplots_fails() {
    let data = load("multilevel.csv", 2, Some(0));
    let err = render(Some(&data), &options(PlotKind::Line, json!({}))).unwrap_err();
    assert!(matches!(err, PlotError::TypeContract(_)));
}

#[test]
fn test_local_logo_inlined() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.png");
    fs::write(&path, [137u8, 80, 78, 71]).unwrap();

    let data = load("timeseries.csv", 1, Some(0));
    let mut opts = options(PlotKind::Scatter, json!({}));
    opts.main_logo = Some(path.to_string_lossy().to_string());
    let fig = render(Some(&data), &opts).unwrap();
    let source = fig.layout["images"][0]["source"].as_str().unwrap();
    assert!(source.starts_with("data:image/png;base64,"));
}

#[test]
fn test_category_labels_without_data() {
    let mut opts = options(PlotKind::Bar, json!({}));
    opts.x = Some(Selector::Columns(vec!["Mon".into(), "Tue".into()]));
    opts.y = Some(Selector::Values(vec![json!(3), json!(5)]));
    let fig = render(None, &opts).unwrap();
    assert_eq!(fig.data[0]["x"], json!(["Mon", "Tue"]));
    assert_eq!(fig.data[0]["type"], json!("bar"));
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn test_end_to_end_line_chart() {
    let fig = run_json(&["--index-col", "0"], &fixture("timeseries.csv"));
    assert_eq!(fig["data"].as_array().unwrap().len(), 2);
    assert_eq!(fig["layout"]["xaxis"]["title"]["text"], json!("time"));
}

#[test]
fn test_end_to_end_bar_with_options() {
    let fig = run_json(
        &["--kind", "bar", "-x", "time", "-y", "temp", "-p", "title='Temperature'", "-p", "ylim=[0, 30]"],
        &fixture("timeseries.csv"),
    );
    assert_eq!(fig["data"][0]["type"], json!("bar"));
    assert_eq!(fig["layout"]["title"]["text"], json!("Temperature"));
    assert_eq!(fig["layout"]["yaxis"]["range"], json!([0, 30]));
}

#[test]
fn test_end_to_end_subplots() {
    let fig = run_json(
        &["--subplots", "--header-rows", "2", "--index-col", "0", "-p", "line_color=[red, blue]"],
        &fixture("multilevel.csv"),
    );
    assert_eq!(fig["data"][2]["line"]["color"], json!("blue"));
}

#[test]
fn test_end_to_end_json_input() {
    let input = r#"[{"a": 1, "b": 2}, {"a": 3, "b": 4}]"#;
    let fig = run_json(&["--json", "--kind", "scatter"], input);
    assert_eq!(fig["data"][1]["y"], json!([2, 4]));
}

#[test]
fn test_end_to_end_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("plot.json");
    fs::write(&config, r#"{"kind": "hist", "title": "Spread", "show": true}"#).unwrap();

    let fig = run_json(
        &["--config", config.to_str().unwrap(), "--index-col", "0", "-p", "nbins=4"],
        &fixture("timeseries.csv"),
    );
    assert_eq!(fig["data"][0]["type"], json!("histogram"));
    assert_eq!(fig["data"][0]["nbinsx"], json!(4));
    assert_eq!(fig["layout"]["title"]["text"], json!("Spread"));
}

#[test]
fn test_end_to_end_html_output() {
    let out = run_tcplot(
        &["--format", "html", "-p", "title=Loop"],
        &fixture("timeseries.csv"),
    )
    .unwrap();
    assert!(out.contains("Plotly.newPlot"));
    assert!(out.contains("\"title\":{\"text\":\"Loop\"}"));
}

#[test]
fn test_error_unknown_kind() {
    let result = run_tcplot(&["--kind", "pie"], &fixture("timeseries.csv"));
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("unknown plot kind 'pie'"));
}

#[test]
fn test_error_missing_column() {
    let result = run_tcplot(&["-y", "humidity"], &fixture("timeseries.csv"));
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Column 'humidity' not found"));
}

#[test]
fn test_error_unexpected_keyword() {
    let result = run_tcplot(&["--kind", "bar", "-p", "markers=true"], &fixture("timeseries.csv"));
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("unexpected keyword argument 'markers'"));
}

#[test]
fn test_error_missing_logo() {
    let result = run_tcplot(&["--main-logo", "/nonexistent/logo.png"], &fixture("timeseries.csv"));
    assert!(result.is_err());
}

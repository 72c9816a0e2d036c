use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tcplot::{parser, render, CsvLayout, OutputFormat, PlotData, PlotKind, PlotOptions, Selector};

#[derive(Parser, Debug)]
#[command(name = "tcplot")]
#[command(about = "Build styled Plotly figures from CSV data", long_about = None)]
struct Args {
    /// Plot kind: line, scatter, bar, imshow, scatter3d, box or hist
    #[arg(short, long)]
    kind: Option<String>,

    /// Column for the x axis (defaults to the index)
    #[arg(short)]
    x: Option<String>,

    /// Column(s) for the y axis (defaults to every column)
    #[arg(short)]
    y: Vec<String>,

    /// Column for z values (imshow, scatter3d)
    #[arg(short)]
    z: Option<String>,

    /// One stacked subplot per column group
    #[arg(long)]
    subplots: bool,

    /// Main logo: URL or local image file
    #[arg(long)]
    main_logo: Option<String>,

    /// Project logo: URL or local image file
    #[arg(long)]
    proj_logo: Option<String>,

    /// Number of header rows; more than one gives multi-level columns
    #[arg(long, default_value_t = 1)]
    header_rows: usize,

    /// Column holding the row index
    #[arg(long)]
    index_col: Option<usize>,

    /// Read stdin as a JSON array of objects instead of CSV
    #[arg(long)]
    json: bool,

    /// JSON file with plot options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Styling option as key=value (e.g. -p title="Flow" -p ylim=[0,5])
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,

    /// Output encoding
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also open the figure as a temporary HTML page
    #[arg(long)]
    show: bool,
}

fn load_options(args: &Args) -> Result<PlotOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<PlotOptions>(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => PlotOptions::default(),
    };

    if let Some(kind) = &args.kind {
        options.kind = kind.parse::<PlotKind>()?;
    }
    if let Some(x) = &args.x {
        options.x = Some(Selector::Column(x.clone()));
    }
    match args.y.as_slice() {
        [] => {}
        [single] => options.y = Some(Selector::Column(single.clone())),
        many => options.y = Some(Selector::Columns(many.to_vec())),
    }
    if args.z.is_some() {
        options.z = args.z.clone();
    }
    if args.main_logo.is_some() {
        options.main_logo = args.main_logo.clone();
    }
    if args.proj_logo.is_some() {
        options.proj_logo = args.proj_logo.clone();
    }
    options.subplots |= args.subplots;
    // The figure goes to stdout; only open a page on request
    options.show = args.show;

    let params = parser::parse_options(&args.params).context("Failed to parse -p options")?;
    options.params.extend(params);
    Ok(options)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let options = load_options(&args)?;
    debug!("Options: {:?}", options);

    let data = if args.json {
        let value: serde_json::Value = serde_json::from_reader(io::stdin().lock())
            .context("Failed to read JSON from stdin")?;
        PlotData::from_json(&value).context("Failed to load JSON records")?
    } else {
        let layout = CsvLayout {
            header_rows: args.header_rows,
            index_col: args.index_col,
        };
        PlotData::from_csv(io::stdin().lock(), &layout).context("Failed to read CSV from stdin")?
    };

    let fig = render(Some(&data), &options).context("Failed to render plot")?;

    let output = match args.format {
        OutputFormat::Json => fig.to_json()?,
        OutputFormat::Html => fig.to_html()?,
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(output.as_bytes())
        .context("Failed to write figure to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

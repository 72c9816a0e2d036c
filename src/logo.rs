// Logo overlays anchored above the top-right corner of the plot area

use crate::error::{PlotError, PlotResult};
use base64::Engine as _;
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// One entry of the layout `images` list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogoOverlay {
    pub name: String,
    pub source: String,
    pub xref: &'static str,
    pub yref: &'static str,
    pub x: f64,
    pub y: f64,
    pub sizex: f64,
    pub sizey: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
    pub opacity: f64,
    pub visible: bool,
}

impl LogoOverlay {
    fn anchored(name: &str, source: String, x: f64) -> Self {
        Self {
            name: name.to_string(),
            source,
            xref: "paper",
            yref: "paper",
            x,
            y: 1.01,
            sizex: 1.0,
            sizey: 0.12,
            xanchor: "right",
            yanchor: "bottom",
            opacity: 1.0,
            visible: true,
        }
    }
}

/// Build the overlay list for the main logo and the optional project logo.
///
/// Remote sources are used verbatim; local files are inlined as data URIs.
pub fn resolve_logos(main: Option<&str>, project: Option<&str>) -> PlotResult<Vec<LogoOverlay>> {
    let mut images = Vec::new();
    if let Some(src) = main {
        images.push(LogoOverlay::anchored("mainlogo", image_source(src)?, 1.0));
    }
    if let Some(src) = project {
        images.push(LogoOverlay::anchored("projlogo", image_source(src)?, 0.75));
    }
    Ok(images)
}

fn image_source(src: &str) -> PlotResult<String> {
    if src.contains("https") {
        return Ok(src.to_string());
    }
    let path = Path::new(src);
    let bytes = fs::read(path).map_err(|source| PlotError::LogoRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Inlining logo {} ({} bytes)", path.display(), bytes.len());
    Ok(data_url(mime_for(path), &bytes))
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, b64)
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

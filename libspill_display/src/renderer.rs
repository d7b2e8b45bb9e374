use std::path::{Path, PathBuf};

use super::config::{Config, RendererKind};
use super::error::RenderError;
use super::readout_window::ReadoutWindow;
use super::record::RecordKey;
use super::svg_renderer::SvgDisplayRenderer;

/// Turns one readout window into one file on disk
pub trait EventDisplayRenderer {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Write the display of `window` to exactly `path`
    fn render(&mut self, window: &ReadoutWindow, path: &Path) -> Result<(), RenderError>;
}

/// Where the display of a record goes.
///
/// Without `overwrite`, an existing display is kept and `-1`, `-2`, ... is appended to the name.
pub fn artifact_path(dir: &Path, key: &RecordKey, extension: &str, overwrite: bool) -> PathBuf {
    let stem = key.to_string();
    let mut path = dir.join(format!("{stem}.{extension}"));
    let mut counter: u32 = 1;
    while !overwrite && path.exists() {
        path = dir.join(format!("{stem}-{counter}.{extension}"));
        counter += 1;
    }
    path
}

/// Build the renderer selected in the config
pub fn make_renderer(config: &Config) -> Result<Box<dyn EventDisplayRenderer + Send>, RenderError> {
    match config.renderer {
        RendererKind::Svg => Ok(Box::new(SvgDisplayRenderer::new(config.tick_ns))),
        #[cfg(feature = "hdf5")]
        RendererKind::Hdf5 => Ok(Box::new(super::hdf_writer::HDFDisplayWriter::new())),
        #[cfg(not(feature = "hdf5"))]
        RendererKind::Hdf5 => Err(RenderError::Unavailable(String::from(
            "hdf5 (rebuild with the hdf5 feature)",
        ))),
    }
}

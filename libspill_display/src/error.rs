use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("RecordExtractor failed to read the raw dump stream: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not open raw dump because file {0:?} does not exist")]
    BadFilePath(PathBuf),
}

#[derive(Debug, Error)]
pub enum RecordTableError {
    #[error("Could not open trigger record table because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Trigger record table failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Trigger record table failed due to CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Trigger record table is missing required column '{0}'")]
    MissingColumn(String),
}

#[derive(Debug, Error)]
pub enum SpillExportError {
    #[error("Could not open beam spill export because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Beam spill export failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Beam spill export failed due to CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Beam spill export is missing required column '{0}'; if the export has no header row, configure spill_header")]
    MissingColumn(String),
}

#[derive(Debug, Clone, Error)]
pub enum SpillWindowError {
    #[error("Spill duration must be greater than zero")]
    ZeroDuration,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Renderer failed to format the display: {0}")]
    FormatError(#[from] std::fmt::Error),
    #[cfg(feature = "hdf5")]
    #[error("Renderer failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[cfg(feature = "hdf5")]
    #[error("Renderer failed to encode a string attribute: {0}")]
    Encoding(String),
    #[error("Renderer {0} is not available in this build")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("Run locator failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Run locator could not scan {0:?} as it does not exist")]
    BadFilePath(PathBuf),
    #[error("Run locator did not find any raw files for run {0}")]
    NoMatchingFiles(u32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config is invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to RecordExtractor error: {0}")]
    ExtractorError(#[from] ExtractorError),
    #[error("Processor failed due to record table error: {0}")]
    TableError(#[from] RecordTableError),
    #[error("Processor failed due to beam spill export error: {0}")]
    SpillExportError(#[from] SpillExportError),
    #[error("Processor failed due to spill window error: {0}")]
    SpillWindowError(#[from] SpillWindowError),
    #[error("Processor failed due to renderer error: {0}")]
    RenderError(#[from] RenderError),
    #[error("Processor failed due to run locator error: {0}")]
    LocatorError(#[from] LocatorError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Processor failed because a worker thread panicked")]
    WorkerPanic,
}

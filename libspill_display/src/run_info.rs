//! Run, subrun and dataflow identifiers encoded in raw file names, e.g.
//! `np04hd_raw_run027396_0003_dataflow1_datawriter_0_20240621T101010.hdf5`
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static RUN_RE: OnceLock<Regex> = OnceLock::new();
static SUBRUN_RE: OnceLock<Regex> = OnceLock::new();
static DATAFLOW_RE: OnceLock<Regex> = OnceLock::new();

fn run_re() -> &'static Regex {
    RUN_RE.get_or_init(|| Regex::new(r"run(\d+)").unwrap())
}

fn subrun_re() -> &'static Regex {
    SUBRUN_RE.get_or_init(|| Regex::new(r"_(\d+)_dataflow").unwrap())
}

fn dataflow_re() -> &'static Regex {
    DATAFLOW_RE.get_or_init(|| Regex::new(r"dataflow(\d+)").unwrap())
}

fn capture_number(re: &Regex, name: &str) -> Option<u32> {
    re.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Identifiers recovered from a raw file name. Any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunInfo {
    pub run: Option<u32>,
    pub subrun: Option<u32>,
    pub dataflow: Option<u32>,
}

impl RunInfo {
    pub fn from_file_name(name: &str) -> Self {
        Self {
            run: capture_number(run_re(), name),
            subrun: capture_number(subrun_re(), name),
            dataflow: capture_number(dataflow_re(), name),
        }
    }

    /// Only the final path component is inspected so directories named run_xxx do not leak in
    pub fn from_path(path: &Path) -> Self {
        match path.file_name() {
            Some(name) => Self::from_file_name(&name.to_string_lossy()),
            None => Self::default(),
        }
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::error::LocatorError;
use super::run_info::RunInfo;

/// A raw file belonging to a run, with the identifiers used to order it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    pub path: PathBuf,
    pub info: RunInfo,
    pub size_bytes: u64,
}

/// Find every raw file of a run below `parent_path`.
///
/// Files are ordered by subrun, then dataflow index, then name, which is the order the
/// data writers produced them in.
pub fn locate_run_files(parent_path: &Path, run_number: u32) -> Result<Vec<LocatedFile>, LocatorError> {
    if !parent_path.exists() {
        return Err(LocatorError::BadFilePath(parent_path.to_path_buf()));
    }
    let pattern = format!("run{run_number:06}");
    let mut file_list: Vec<LocatedFile> = Vec::new();
    for item in parent_path.read_dir()? {
        let item_path = item?.path();
        if !item_path.is_file() {
            continue;
        }
        let Some(name) = item_path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        let info = RunInfo::from_file_name(&name);
        if name.contains(&pattern) && info.run == Some(run_number) {
            let size_bytes = item_path.metadata()?.len();
            file_list.push(LocatedFile {
                path: item_path,
                info,
                size_bytes,
            });
        }
    }

    if file_list.is_empty() {
        return Err(LocatorError::NoMatchingFiles(run_number));
    }

    file_list.sort_by(|a, b| {
        (a.info.subrun, a.info.dataflow, &a.path).cmp(&(b.info.subrun, b.info.dataflow, &b.path))
    });

    let total_size: u64 = file_list.iter().map(|f| f.size_bytes).sum();
    spdlog::info!(
        "Located {} files for run {run_number} with total size: {}",
        file_list.len(),
        human_bytes::human_bytes(total_size as f64)
    );

    Ok(file_list)
}

/// Write one path per line
pub fn write_file_list(path: &Path, files: &[PathBuf]) -> Result<(), std::io::Error> {
    let mut file = File::create(path)?;
    for f in files {
        writeln!(file, "{}", f.display())?;
    }
    Ok(())
}

/// Read a file list. Blank lines are ignored and listed paths that do not exist are dropped
/// with a warning.
pub fn read_file_list(path: &Path) -> Result<Vec<PathBuf>, LocatorError> {
    if !path.exists() {
        return Err(LocatorError::BadFilePath(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut files = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        let file_path = PathBuf::from(entry);
        if file_path.exists() {
            files.push(file_path);
        } else {
            spdlog::warn!("Listed file {} does not exist, skipping", file_path.display());
        }
    }
    Ok(files)
}

/// First path of the sequence `stem.ext`, `stem1.ext`, `stem2.ext`, ... that does not exist yet
pub fn next_free_path(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = base.extension().map(|e| e.to_string_lossy().to_string());
    let parent = base.parent().unwrap_or(Path::new(""));
    let mut counter: u32 = 1;
    loop {
        let name = match &ext {
            Some(ext) => format!("{stem}{counter}.{ext}"),
            None => format!("{stem}{counter}"),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "x").unwrap();
        path
    }

    #[test]
    fn test_locate_sorted_by_subrun_then_dataflow() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "np04hd_raw_run027396_0001_dataflow1_datawriter_0.hdf5");
        touch(dir.path(), "np04hd_raw_run027396_0001_dataflow0_datawriter_0.hdf5");
        touch(dir.path(), "np04hd_raw_run027396_0000_dataflow1_datawriter_0.hdf5");
        touch(dir.path(), "np04hd_raw_run027397_0000_dataflow0_datawriter_0.hdf5");
        touch(dir.path(), "np04hd_raw_run0273960_0000_dataflow0_datawriter_0.hdf5");

        let files = locate_run_files(dir.path(), 27396).unwrap();
        let order: Vec<(Option<u32>, Option<u32>)> =
            files.iter().map(|f| (f.info.subrun, f.info.dataflow)).collect();
        assert_eq!(order, vec![(Some(0), Some(1)), (Some(1), Some(0)), (Some(1), Some(1))]);
        assert_eq!(files[0].size_bytes, 1);
    }

    #[test]
    fn test_locate_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "unrelated.txt");
        assert!(matches!(
            locate_run_files(dir.path(), 1),
            Err(LocatorError::NoMatchingFiles(1))
        ));
        assert!(matches!(
            locate_run_files(&dir.path().join("missing"), 1),
            Err(LocatorError::BadFilePath(_))
        ));
    }

    #[test]
    fn test_file_list_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        let present = touch(dir.path(), "a.txt");
        let list = dir.path().join("list.txt");
        std::fs::write(
            &list,
            format!("{}\n\n{}\n", present.display(), dir.path().join("gone.txt").display()),
        )
        .unwrap();
        assert_eq!(read_file_list(&list).unwrap(), vec![present.clone()]);

        let out = dir.path().join("out.txt");
        write_file_list(&out, &[present.clone()]).unwrap();
        assert_eq!(read_file_list(&out).unwrap(), vec![present]);
    }

    #[test]
    fn test_next_free_path() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("output.csv");
        assert_eq!(next_free_path(&base), base);
        touch(dir.path(), "output.csv");
        assert_eq!(next_free_path(&base), dir.path().join("output1.csv"));
        touch(dir.path(), "output1.csv");
        assert_eq!(next_free_path(&base), dir.path().join("output2.csv"));
    }
}

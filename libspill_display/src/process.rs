use fxhash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use super::config::Config;
use super::error::{ExtractorError, ProcessorError};
use super::extractor::{DumpFileSource, RawDumpSource, RecordExtractor};
use super::file_locator::{locate_run_files, write_file_list};
use super::plane_map::PlaneMap;
use super::readout_window::ReadoutAssembler;
use super::record::{RecordKey, TriggerRecord};
use super::record_table::{read_record_table, write_labeled_table, RecordTableWriter};
use super::renderer::{artifact_path, make_renderer};
use super::run_info::RunInfo;
use super::spill_export::read_spill_export;
use super::spill_matcher::{detector_ns_to_spill_ms, MatchedRecords, SpillMatcher};
use super::spill_window::SpillWindowBuilder;
use super::summary::RunSummary;
use super::worker_status::{Stage, WorkerStatus};

/// Open the dump of one listed file. A file that cannot be opened is reported and skipped.
fn open_extractor(
    source: &dyn RawDumpSource,
    path: &Path,
    config: &Config,
) -> Option<RecordExtractor<Box<dyn std::io::BufRead + Send>>> {
    match RecordExtractor::open(source, path, config.trigger_type, config.tick_ns) {
        Ok(ex) => Some(ex),
        Err(ExtractorError::BadFilePath(p)) => {
            spdlog::warn!("File {} not found, skipping", p.display());
            None
        }
        Err(e) => {
            spdlog::warn!("Could not read {}: {e}\nSkipping file.", path.display());
            None
        }
    }
}

/// Where trigger ids must be unique: the (run, subrun), or the file itself when the name did not
/// give both
type DuplicateScope = (Option<u32>, Option<u32>, Option<PathBuf>);

fn duplicate_scope(run: Option<u32>, subrun: Option<u32>, path: &Path) -> DuplicateScope {
    match (run, subrun) {
        (Some(_), Some(_)) => (run, subrun, None),
        _ => (run, subrun, Some(path.to_path_buf())),
    }
}

/// Locate the raw files of a run and write them, ordered, to `output`
pub fn locate_run(config: &Config, run_number: u32, output: &Path) -> Result<Vec<PathBuf>, ProcessorError> {
    let files: Vec<PathBuf> = locate_run_files(&config.raw_data_path, run_number)?
        .into_iter()
        .map(|f| f.path)
        .collect();
    write_file_list(output, &files)?;
    spdlog::info!("Wrote {} file paths to {}", files.len(), output.display());
    Ok(files)
}

/// Extract every record of the configured trigger type from the given files into one table.
///
/// `output` must already be resolved by the caller; rows are appended to it.
pub fn filter_files(
    config: &Config,
    files: &[PathBuf],
    source: &dyn RawDumpSource,
    output: &Path,
    tx: &Sender<WorkerStatus>,
) -> Result<RunSummary, ProcessorError> {
    let mut writer = RecordTableWriter::open(output, config.tick_ns)?;
    let mut summary = RunSummary::default();
    let mut seen: FxHashMap<DuplicateScope, FxHashSet<u64>> = FxHashMap::default();
    let mut duplicates: u64 = 0;

    tx.send(WorkerStatus::new(0, files.len(), 0, Stage::Filtering))?;
    for (idx, path) in files.iter().enumerate() {
        if let Some(mut extractor) = open_extractor(source, path, config) {
            spdlog::info!("Filtering {}...", path.display());
            spdlog::debug!("Run info of {}: {:?}", path.display(), extractor.run_info());
            loop {
                let block = match extractor.get_next_block() {
                    Ok(Some(block)) => block,
                    Ok(None) => break,
                    Err(e) => {
                        spdlog::warn!("Stopped reading {} early: {e}", path.display());
                        break;
                    }
                };
                let entry = &block.entry;
                let ids = seen.entry(duplicate_scope(entry.run, entry.subrun, path)).or_default();
                if !ids.insert(entry.trigger_id) {
                    duplicates += 1;
                    spdlog::warn!("Duplicate {} in {}, skipping", entry.key(), path.display());
                    continue;
                }
                writer.write_record(&TriggerRecord::from_raw(entry, config.tick_ns))?;
            }
            summary.add_extraction(extractor.stats());
        }
        tx.send(WorkerStatus::new(idx + 1, files.len(), 0, Stage::Filtering))?;
    }

    // the extractor counted duplicates as parsed
    summary.parsed -= duplicates;
    summary.skipped += duplicates;
    spdlog::info!(
        "Wrote {} trigger records to {}",
        writer.rows_written(),
        output.display()
    );
    writer.close()?;
    tx.send(WorkerStatus::new(files.len(), files.len(), 0, Stage::Finished))?;
    spdlog::info!("Filtering summary -- {summary}");
    Ok(summary)
}

/// Build the windows over the time range of the records and freeze them into a matcher
pub fn build_matcher(config: &Config, clocks: &[i64], records: &[TriggerRecord]) -> Result<SpillMatcher, ProcessorError> {
    let mut builder = SpillWindowBuilder::new(config.spill_duration_ms)?;
    let times = records
        .iter()
        .map(|r| detector_ns_to_spill_ms(r.timestamp_ns, config.time_base_offset_ms));
    if let (Some(min_ms), Some(max_ms)) = (times.clone().min(), times.max()) {
        builder = builder.with_horizon(min_ms, max_ms);
    }
    let windows = builder.build(clocks.iter().copied());
    let matcher = SpillMatcher::new(&windows, config.time_base_offset_ms);
    spdlog::info!(
        "Matching against {} windows with spill duration {} ms and time base offset {} ms",
        matcher.n_windows(),
        builder.duration_ms(),
        matcher.time_base_offset_ms()
    );
    Ok(matcher)
}

/// Classify the filtered records against the beam export.
///
/// The beam export is read first: a bad export stops everything before any record is classified.
/// If `output` is given the spill labelled table is written there.
pub fn match_records(
    config: &Config,
    spill_path: &Path,
    records_path: &Path,
    output: Option<&Path>,
) -> Result<(MatchedRecords, RunSummary), ProcessorError> {
    let spills = read_spill_export(spill_path, config.spill_header.as_deref())?;
    let clocks: Vec<i64> = spills.iter().map(|s| s.clock_ms).collect();
    let records = read_record_table(records_path, config.tick_ns)?;

    let matcher = build_matcher(config, &clocks, &records)?;
    let matched = matcher.partition(&records);

    if let Some(path) = output {
        write_labeled_table(path, &matched.labeled, config.tick_ns)?;
        spdlog::info!("Wrote spill labelled records to {}", path.display());
    }

    let summary = RunSummary {
        parsed: records.len() as u64,
        on: matched.on.len() as u64,
        off: matched.off.len() as u64,
        ..Default::default()
    };
    Ok((matched, summary))
}

/// Divide files among workers.
///
/// Files of one (run, subrun) always land on the same worker, so a record key can only ever be
/// met by one worker. Only subsets with work in them are returned.
pub fn create_subsets(files: &[PathBuf], n_threads: i32) -> Vec<Vec<PathBuf>> {
    let n_subsets = n_threads.max(1) as usize;
    let mut groups: Vec<((Option<u32>, Option<u32>), Vec<PathBuf>)> = Vec::new();
    for file in files {
        let info = RunInfo::from_path(file);
        let group_key = (info.run, info.subrun);
        match groups.iter_mut().find(|(k, _)| *k == group_key) {
            Some((_, group)) => group.push(file.clone()),
            None => groups.push((group_key, vec![file.clone()])),
        }
    }

    let mut subsets: Vec<Vec<PathBuf>> = vec![Vec::new(); n_subsets];
    for (idx, (_, group)) in groups.into_iter().enumerate() {
        subsets[idx % n_subsets].extend(group);
    }
    subsets.retain(|s| !s.is_empty());
    subsets
}

/// What one display worker did
#[derive(Debug, Default)]
pub struct WorkerOutcome {
    pub summary: RunSummary,
    pub found: FxHashSet<RecordKey>,
}

/// Render the display of every ON record found in a subset of files.
///
/// A failed render is logged and counted; it never stops the worker.
pub fn render_subset(
    config: &Config,
    files: &[PathBuf],
    on_keys: &FxHashSet<RecordKey>,
    output_dir: &Path,
    overwrite: bool,
    tx: &Sender<WorkerStatus>,
    worker_id: usize,
) -> Result<WorkerOutcome, ProcessorError> {
    let mut renderer = make_renderer(config)?;
    let assembler = ReadoutAssembler::new(PlaneMap::new(&config.planes), config.tick_ns);
    let source = DumpFileSource;
    let mut outcome = WorkerOutcome::default();

    tx.send(WorkerStatus::new(0, files.len(), worker_id, Stage::Rendering))?;
    for (idx, path) in files.iter().enumerate() {
        if let Some(mut extractor) = open_extractor(&source, path, config) {
            spdlog::info!("Worker {worker_id} reading {}...", path.display());
            loop {
                let block = match extractor.get_next_block() {
                    Ok(Some(block)) => block,
                    Ok(None) => break,
                    Err(e) => {
                        spdlog::warn!("Stopped reading {} early: {e}", path.display());
                        break;
                    }
                };
                let key = block.entry.key();
                if !on_keys.contains(&key) {
                    continue;
                }
                if !outcome.found.insert(key) {
                    spdlog::warn!("{key} appears more than once in the file list; rendered only once");
                    continue;
                }

                let window = assembler.assemble(&block);
                spdlog::info!("{key}: {} TPs in readout window", window.n_samples());
                let artifact = artifact_path(output_dir, &key, renderer.extension(), overwrite);
                match renderer.render(&window, &artifact) {
                    Ok(()) => {
                        outcome.summary.rendered += 1;
                        spdlog::debug!("Saved {}", artifact.display());
                    }
                    Err(e) => {
                        outcome.summary.render_failed += 1;
                        spdlog::warn!("Could not write display of {key} to {}: {e}", artifact.display());
                    }
                }
            }
        }
        tx.send(WorkerStatus::new(idx + 1, files.len(), worker_id, Stage::Rendering))?;
    }
    tx.send(WorkerStatus::new(files.len(), files.len(), worker_id, Stage::Finished))?;
    Ok(outcome)
}

/// Match the records against the spills, then render every ON record found in `files`.
///
/// Work is split over `config.n_threads` workers sharing the read-only ON key set.
pub fn generate_displays(
    config: &Config,
    files: &[PathBuf],
    spill_path: &Path,
    records_path: &Path,
    output_dir: &Path,
    overwrite: bool,
    tx: Sender<WorkerStatus>,
) -> Result<RunSummary, ProcessorError> {
    let (matched, mut summary) = match_records(config, spill_path, records_path, None)?;
    let on_keys: FxHashSet<RecordKey> = matched.on.iter().map(|r| r.key()).collect();

    let mut unique_files: Vec<PathBuf> = Vec::with_capacity(files.len());
    for file in files {
        if !unique_files.contains(file) {
            unique_files.push(file.clone());
        }
    }

    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir)?;
    }

    let subsets = create_subsets(&unique_files, config.n_threads);
    spdlog::info!(
        "Rendering {} spill ON records from {} files with {} workers",
        on_keys.len(),
        unique_files.len(),
        subsets.len()
    );

    let outcomes: Vec<Result<WorkerOutcome, ProcessorError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = subsets
            .iter()
            .enumerate()
            .map(|(worker_id, subset)| {
                let tx = tx.clone();
                let on_keys = &on_keys;
                scope.spawn(move || {
                    render_subset(config, subset, on_keys, output_dir, overwrite, &tx, worker_id)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(Err(ProcessorError::WorkerPanic)))
            .collect()
    });

    let mut found: FxHashSet<RecordKey> = FxHashSet::default();
    for outcome in outcomes {
        let outcome = outcome?;
        summary += outcome.summary;
        found.extend(outcome.found);
    }

    let mut missing: Vec<&RecordKey> = on_keys.difference(&found).collect();
    missing.sort();
    for key in missing {
        spdlog::warn!("{key} is spill ON but was not found in any listed file");
    }

    spdlog::info!("Display summary -- {summary}");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpillExportError;
    use std::sync::mpsc::channel;

    const SPILL_HEADER: &str = "Event,Variable,Clock\n";

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    /// A dump line for a record at `ms` of detector time (1 ms = 62_500 ticks)
    fn header(trigger: u64, trigger_type: u32, ms: u64) -> String {
        format!(
            "Trigger record header: trigger_number: {trigger}, trigger_timestamp: {}, trigger_type: {trigger_type}\n",
            ms * 62_500
        )
    }

    fn primitive(channel: u32, ms: u64, extra_ticks: u64) -> String {
        format!(
            "  Trigger primitive: channel: {channel}, time_start: {}, adc_integral: 300, adc_peak: 20\n",
            ms * 62_500 + extra_ticks
        )
    }

    fn raw_name(subrun: u32, dataflow: u32) -> String {
        format!("np04hd_raw_run027396_{subrun:04}_dataflow{dataflow}_datawriter_0.txt")
    }

    #[test]
    fn test_filter_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let f0 = write(
            dir.path(),
            &raw_name(0, 0),
            &(header(0, 8, 1000) + &header(1, 2, 1100) + &header(2, 8, 1200)),
        );
        let f1 = write(dir.path(), &raw_name(0, 1), &header(3, 2, 1300));
        let f2 = write(dir.path(), &raw_name(1, 0), &header(0, 8, 1400));
        let output = dir.path().join("output.csv");

        let (tx, _rx) = channel();
        let summary =
            filter_files(&Config::default(), &[f0, f1, f2], &DumpFileSource, &output, &tx).unwrap();
        assert_eq!(summary.parsed, 3);
        assert_eq!(summary.filtered_out, 2);

        let records = read_record_table(&output, 16).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.run == Some(27396) && r.subrun.is_some()));
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("Run,Subrun,Trigger_Record,Timestamp\n"));
    }

    #[test]
    fn test_filter_missing_file_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let f0 = write(
            dir.path(),
            &raw_name(0, 0),
            &(header(4, 8, 1000) + &header(4, 8, 1001)),
        );
        let gone = dir.path().join(raw_name(0, 1));
        let output = dir.path().join("output.csv");

        let (tx, _rx) = channel();
        let summary =
            filter_files(&Config::default(), &[gone, f0], &DumpFileSource, &output, &tx).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.parsed, 1);
        assert_eq!(read_record_table(&output, 16).unwrap().len(), 1);
    }

    #[test]
    fn test_filter_huge_trigger_number() {
        let dir = tempfile::tempdir().unwrap();
        let f0 = write(
            dir.path(),
            &raw_name(0, 0),
            "trigger_number: 18446744073709551615, trigger_timestamp: 100, trigger_type: 8\n\
             trigger_number: 18446744073709551615, trigger_timestamp: 200, trigger_type: 8\n\
             trigger_number: 68719476736, trigger_timestamp: 300, trigger_type: 8\n",
        );
        let output = dir.path().join("output.csv");

        let (tx, _rx) = channel();
        let summary = filter_files(&Config::default(), &[f0], &DumpFileSource, &output, &tx).unwrap();
        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.skipped, 1);
        let records = read_record_table(&output, 16).unwrap();
        assert_eq!(records[0].trigger_id, u64::MAX);
        assert_eq!(records[1].trigger_id, 1 << 36);
    }

    #[test]
    fn test_filter_unnamed_files_are_not_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "dumpA.txt", &header(1, 8, 1000));
        let b = write(dir.path(), "dumpB.txt", &header(1, 8, 2000));
        let output = dir.path().join("output.csv");

        let (tx, _rx) = channel();
        let summary =
            filter_files(&Config::default(), &[a.clone(), b, a], &DumpFileSource, &output, &tx).unwrap();
        // the same unnamed file listed twice still repeats its ids
        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.skipped, 1);
        let records = read_record_table(&output, 16).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.run.is_none() && r.subrun.is_none()));
        assert_ne!(records[0].timestamp_ns, records[1].timestamp_ns);
    }

    #[test]
    fn test_offset_records_before_first_extraction() {
        let record = |trigger_id: u64, ms: u64| TriggerRecord {
            run: Some(1),
            subrun: Some(0),
            trigger_id,
            timestamp_ns: ms * 1_000_000,
        };
        // with the offset these land at 1500 ms and 3500 ms of beam time
        let records = vec![record(0, 500), record(1, 2500)];
        let config = Config {
            spill_duration_ms: 2000,
            time_base_offset_ms: 1000,
            ..Default::default()
        };
        let matcher = build_matcher(&config, &[3000], &records).unwrap();
        assert_eq!(matcher.n_windows(), 2);

        let matched = matcher.partition(&records);
        assert_eq!(matched.out_of_range, 0);
        assert_eq!(matched.off.len(), 1);
        assert_eq!(matched.off[0].trigger_id, 0);
        assert_eq!(matched.on.len(), 1);
        assert_eq!(matched.on[0].trigger_id, 1);
    }

    #[test]
    fn test_match_fails_fast_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let spill = write(dir.path(), "spill.csv", "1,XBH4,1000\n2,XBH4,5000\n");
        let records = write(
            dir.path(),
            "records.csv",
            "Run,Subrun,Trigger_Record,Timestamp\n1,0,0,62500000\n",
        );
        let labeled = dir.path().join("labeled.csv");
        let result = match_records(&Config::default(), &spill, &records, Some(&labeled));
        match result {
            Err(ProcessorError::SpillExportError(SpillExportError::MissingColumn(c))) => {
                assert_eq!(c, "Event")
            }
            other => panic!("expected missing column, got {other:?}"),
        }
        assert!(!labeled.exists());

        let config = Config {
            spill_header: Some(vec![
                String::from("Event"),
                String::from("Variable"),
                String::from("Clock"),
            ]),
            ..Default::default()
        };
        let (matched, _) = match_records(&config, &spill, &records, Some(&labeled)).unwrap();
        assert_eq!(matched.on.len(), 1);
        assert!(labeled.exists());
    }

    #[test]
    fn test_match_with_scenario_windows() {
        let dir = tempfile::tempdir().unwrap();
        let spill = write(
            dir.path(),
            "spill.csv",
            &format!("{SPILL_HEADER}1,XBH4,1000\n2,XBH4,1000\n3,XBH4,5000\n"),
        );
        // 4000 ms and 2000 ms of detector time, in 16 ns ticks
        let records = write(
            dir.path(),
            "records.csv",
            "Run,Subrun,Trigger_Record,Timestamp\n1,0,0,250000000\n1,0,1,125000000\n",
        );
        let config = Config {
            spill_duration_ms: 2000,
            ..Default::default()
        };
        let (matched, summary) = match_records(&config, &spill, &records, None).unwrap();
        assert_eq!(matched.off.len(), 1);
        assert_eq!(matched.off[0].trigger_id, 0);
        assert_eq!(matched.on[0].trigger_id, 1);
        assert_eq!(matched.out_of_range, 0);
        assert_eq!(summary.on, 1);
        assert_eq!(summary.off, 1);
    }

    #[test]
    fn test_subsets_keep_subruns_together() {
        let files: Vec<PathBuf> = vec![
            PathBuf::from(raw_name(0, 0)),
            PathBuf::from(raw_name(0, 1)),
            PathBuf::from(raw_name(1, 0)),
            PathBuf::from(raw_name(1, 1)),
            PathBuf::from(raw_name(2, 0)),
        ];
        let subsets = create_subsets(&files, 2);
        assert_eq!(subsets.len(), 2);
        assert_eq!(subsets[0], vec![files[0].clone(), files[1].clone(), files[4].clone()]);
        assert_eq!(subsets[1], vec![files[2].clone(), files[3].clone()]);

        let more_workers_than_work = create_subsets(&files[..2], 8);
        assert_eq!(more_workers_than_work.len(), 1);
    }

    fn display_fixture(dir: &Path) -> (Vec<PathBuf>, PathBuf, PathBuf) {
        // records 0 and 2 sit inside spills, record 1 between them
        let dump0 = header(0, 8, 1500)
            + &primitive(7300, 1500, 10)
            + &primitive(7301, 1500, 20)
            + &primitive(3000, 1500, 10)
            + &header(2, 8, 5500);
        let dump1 = header(1, 8, 4000) + &primitive(7300, 4000, 10);
        let f0 = write(dir, &raw_name(0, 0), &dump0);
        let f1 = write(dir, &raw_name(0, 1), &dump1);
        let spill = write(
            dir,
            "spill.csv",
            &format!("{SPILL_HEADER}1,XBH4,1000\n2,XBH4,5000\n"),
        );
        let records = dir.join("records.csv");
        let (tx, _rx) = channel();
        let config = Config {
            spill_duration_ms: 2000,
            ..Default::default()
        };
        filter_files(&config, &[f0.clone(), f1.clone()], &DumpFileSource, &records, &tx).unwrap();
        (vec![f0, f1], spill, records)
    }

    #[test]
    fn test_generate_displays() {
        let dir = tempfile::tempdir().unwrap();
        let (files, spill, records) = display_fixture(dir.path());
        let out = dir.path().join("displays");
        let config = Config {
            spill_duration_ms: 2000,
            n_threads: 2,
            ..Default::default()
        };

        let (tx, rx) = channel();
        let summary =
            generate_displays(&config, &files, &spill, &records, &out, false, tx).unwrap();
        assert_eq!(summary.on, 2);
        assert_eq!(summary.off, 1);
        assert_eq!(summary.rendered, 2);
        assert_eq!(summary.render_failed, 0);

        let with_tps = out.join("Run27396-Subrun0000-TriggerRecord0.svg");
        let empty = out.join("Run27396-Subrun0000-TriggerRecord2.svg");
        assert!(with_tps.exists());
        assert!(empty.exists());
        assert!(!out.join("Run27396-Subrun0000-TriggerRecord1.svg").exists());
        let svg = std::fs::read_to_string(with_tps).unwrap();
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(std::fs::read_to_string(empty).unwrap().contains("no primitives"));

        let statuses: Vec<WorkerStatus> = rx.try_iter().collect();
        assert!(statuses.iter().any(|s| s.stage == Stage::Finished));

        // a second pass keeps the first displays
        let (tx, _rx) = channel();
        generate_displays(&config, &files, &spill, &records, &out, false, tx).unwrap();
        assert!(out.join("Run27396-Subrun0000-TriggerRecord0-1.svg").exists());
    }

    #[test]
    fn test_render_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (files, spill, records) = display_fixture(dir.path());
        let config = Config {
            spill_duration_ms: 2000,
            ..Default::default()
        };

        let (tx, _rx) = channel();
        let subsets = create_subsets(&files, 1);
        let matched = match_records(&config, &spill, &records, None).unwrap().0;
        let on_keys: FxHashSet<RecordKey> = matched.on.iter().map(|r| r.key()).collect();
        let outcome = render_subset(
            &config,
            &subsets[0],
            &on_keys,
            &dir.path().join("does/not/exist"),
            false,
            &tx,
            0,
        )
        .unwrap();
        assert_eq!(outcome.summary.rendered, 0);
        assert_eq!(outcome.summary.render_failed, 2);
        assert_eq!(outcome.found.len(), 2);
    }

    #[test]
    fn test_locate_run_writes_list() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &raw_name(1, 0), "");
        write(dir.path(), &raw_name(0, 0), "");
        let list = dir.path().join("files.txt");
        let config = Config {
            raw_data_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let files = locate_run(&config, 27396, &list).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].to_string_lossy().contains("_0000_dataflow"));
        let text = std::fs::read_to_string(list).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}

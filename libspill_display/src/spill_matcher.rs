use super::constants::NS_PER_MS;
use super::record::TriggerRecord;
use super::spill_window::{SpillState, SpillWindow};

/// Convert detector time to beam server milliseconds
pub fn detector_ns_to_spill_ms(timestamp_ns: u64, time_base_offset_ms: i64) -> i64 {
    (timestamp_ns / NS_PER_MS as u64) as i64 + time_base_offset_ms
}

/// A window translated into detector time
#[derive(Debug, Clone, Copy)]
struct DetectorWindow {
    start_ns: i128,
    end_ns: i128,
    window: SpillWindow,
}

/// A record and the state it was classified with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledRecord {
    pub record: TriggerRecord,
    pub state: SpillState,
}

/// Records split by spill state. `labeled` keeps the input order.
#[derive(Debug, Clone, Default)]
pub struct MatchedRecords {
    pub labeled: Vec<LabeledRecord>,
    pub on: Vec<TriggerRecord>,
    pub off: Vec<TriggerRecord>,
    pub out_of_range: u64,
}

/// Classifies trigger records against a frozen list of spill windows.
///
/// The time base offset is folded into the windows once here, so lookups compare detector
/// nanoseconds directly.
#[derive(Debug, Clone)]
pub struct SpillMatcher {
    windows: Vec<DetectorWindow>,
    time_base_offset_ms: i64,
}

impl SpillMatcher {
    /// `windows` must be ordered and non-overlapping, as produced by the builder
    pub fn new(windows: &[SpillWindow], time_base_offset_ms: i64) -> Self {
        let to_ns = |ms: i64| (ms as i128 - time_base_offset_ms as i128) * NS_PER_MS as i128;
        let windows = windows
            .iter()
            .map(|w| DetectorWindow {
                start_ns: to_ns(w.start_ms),
                end_ns: to_ns(w.end_ms),
                window: *w,
            })
            .collect();
        Self {
            windows,
            time_base_offset_ms,
        }
    }

    pub fn time_base_offset_ms(&self) -> i64 {
        self.time_base_offset_ms
    }

    pub fn n_windows(&self) -> usize {
        self.windows.len()
    }

    /// Find the window holding a detector time. Boundaries belong to the window that starts there.
    pub fn lookup(&self, timestamp_ns: u64) -> Option<&SpillWindow> {
        let t = timestamp_ns as i128;
        let idx = self.windows.partition_point(|w| w.start_ns <= t);
        let candidate = self.windows.get(idx.checked_sub(1)?)?;
        if t < candidate.end_ns {
            Some(&candidate.window)
        } else {
            None
        }
    }

    /// State of one record. Anything outside the covered range is OFF.
    pub fn classify(&self, record: &TriggerRecord) -> SpillState {
        self.classify_checked(record).unwrap_or(SpillState::Off)
    }

    fn classify_checked(&self, record: &TriggerRecord) -> Option<SpillState> {
        self.lookup(record.timestamp_ns).map(|w| w.state)
    }

    /// Classify every record and split them into ON and OFF sets
    pub fn partition<'a, I: IntoIterator<Item = &'a TriggerRecord>>(
        &self,
        records: I,
    ) -> MatchedRecords {
        let mut matched = MatchedRecords::default();
        for record in records {
            let state = match self.classify_checked(record) {
                Some(state) => state,
                None => {
                    matched.out_of_range += 1;
                    spdlog::warn!(
                        "{} at {} ms lies outside every spill window; classified OFF",
                        record.key(),
                        detector_ns_to_spill_ms(record.timestamp_ns, self.time_base_offset_ms)
                    );
                    SpillState::Off
                }
            };
            match state {
                SpillState::On => matched.on.push(*record),
                SpillState::Off => matched.off.push(*record),
            }
            matched.labeled.push(LabeledRecord {
                record: *record,
                state,
            });
        }
        spdlog::info!(
            "Classified {} records: {} ON, {} OFF",
            matched.labeled.len(),
            matched.on.len(),
            matched.off.len()
        );
        matched
    }
}

use std::fmt::Display;

/// Identifies one trigger record across the whole analysis.
///
/// Run and subrun come from the raw file name and may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub run: Option<u32>,
    pub subrun: Option<u32>,
    pub trigger_id: u64,
}

impl RecordKey {
    pub fn new(run: Option<u32>, subrun: Option<u32>, trigger_id: u64) -> Self {
        Self {
            run,
            subrun,
            trigger_id,
        }
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.run {
            Some(r) => write!(f, "Run{r}")?,
            None => write!(f, "Rununknown")?,
        }
        match self.subrun {
            Some(s) => write!(f, "-Subrun{s:04}")?,
            None => write!(f, "-Subrununknown")?,
        }
        write!(f, "-TriggerRecord{}", self.trigger_id)
    }
}

/// One record header exactly as it was read from the dump, before any unit conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecordEntry {
    pub run: Option<u32>,
    pub subrun: Option<u32>,
    pub trigger_type: u32,
    pub trigger_id: u64,
    /// Detector clock ticks
    pub timestamp: u64,
}

impl RawRecordEntry {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.run, self.subrun, self.trigger_id)
    }
}

/// The canonical record used by matching and display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRecord {
    pub run: Option<u32>,
    pub subrun: Option<u32>,
    pub trigger_id: u64,
    pub timestamp_ns: u64,
}

impl TriggerRecord {
    pub fn from_raw(entry: &RawRecordEntry, tick_ns: u64) -> Self {
        Self {
            run: entry.run,
            subrun: entry.subrun,
            trigger_id: entry.trigger_id,
            timestamp_ns: entry.timestamp.saturating_mul(tick_ns),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.run, self.subrun, self.trigger_id)
    }

    /// Back to detector ticks, as stored in the record tables
    pub fn timestamp_ticks(&self, tick_ns: u64) -> u64 {
        self.timestamp_ns / tick_ns
    }
}

/// A single trigger primitive sample. All times are in ns of detector time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Primitive {
    pub channel: u32,
    pub time_start_ns: u64,
    pub time_peak_ns: u64,
    pub time_over_threshold_ns: u64,
    pub adc_integral: u64,
    pub adc_peak: u64,
    pub detid: u16,
}

/// A record header together with every primitive listed in its own block of the dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBlock {
    pub entry: RawRecordEntry,
    pub primitives: Vec<Primitive>,
}

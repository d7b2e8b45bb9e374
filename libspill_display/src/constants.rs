/// Trigger type of the records we keep by default (random/beam trigger)
pub const DEFAULT_TRIGGER_TYPE: u32 = 8;
/// Detector timing system runs at 62.5 MHz
pub const DEFAULT_TICK_NS: u64 = 16;
/// Nominal SPS slow-extraction length
pub const DEFAULT_SPILL_DURATION_MS: i64 = 4_800;
/// Length of a readout window in detector ticks
pub const DEFAULT_READOUT_TICKS: u64 = 368_640;

pub const NS_PER_MS: i64 = 1_000_000;

/// Labeled fields of a trigger record header in the raw dump
pub const TRIGGER_NUMBER_KEY: &str = "trigger_number";
pub const TRIGGER_TIMESTAMP_KEY: &str = "trigger_timestamp";
pub const TRIGGER_TYPE_KEY: &str = "trigger_type";
/// Optional; checked against the run in the file name, which always wins
pub const RUN_NUMBER_KEY: &str = "run_number";

/// Labeled fields of a trigger primitive in the raw dump
pub const TP_CHANNEL_KEY: &str = "channel";
pub const TP_TIME_START_KEY: &str = "time_start";
pub const TP_TIME_PEAK_KEY: &str = "time_peak";
pub const TP_TIME_OVER_THRESHOLD_KEY: &str = "time_over_threshold";
pub const TP_ADC_INTEGRAL_KEY: &str = "adc_integral";
pub const TP_ADC_PEAK_KEY: &str = "adc_peak";
pub const TP_DETID_KEY: &str = "detid";

/// Columns the beam spill export must carry
pub const SPILL_EVENT_COLUMN: &str = "Event";
pub const SPILL_VARIABLE_COLUMN: &str = "Variable";
pub const SPILL_CLOCK_COLUMN: &str = "Clock";

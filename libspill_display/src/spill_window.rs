use std::fmt::Display;

use super::constants::NS_PER_MS;
use super::error::SpillWindowError;

/// Whether the beam was being extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpillState {
    On,
    Off,
}

impl Display for SpillState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
        }
    }
}

/// Half open interval `[start_ms, end_ms)` of beam server time with a spill state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpillWindow {
    pub start_ms: i64,
    pub end_ms: i64,
    pub state: SpillState,
}

impl SpillWindow {
    pub fn new(start_ms: i64, end_ms: i64, state: SpillState) -> Self {
        Self {
            start_ms,
            end_ms,
            state,
        }
    }

    pub fn contains(&self, time_ms: i64) -> bool {
        self.start_ms <= time_ms && time_ms < self.end_ms
    }
}

impl Display for SpillWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}, {})", self.state, self.start_ms, self.end_ms)
    }
}

/// Render UTC milliseconds for humans, used when logging window ranges
pub fn utc_string(time_ms: i64) -> String {
    match time::OffsetDateTime::from_unix_timestamp_nanos(time_ms as i128 * NS_PER_MS as i128) {
        Ok(dt) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03} UTC",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            dt.millisecond()
        ),
        Err(_) => format!("{time_ms} ms"),
    }
}

/// Derives ON/OFF windows from start-of-extraction instants.
///
/// The export only carries extraction starts, so every instant opens an ON window of a fixed
/// nominal duration. When the next extraction starts before that duration has elapsed the ON
/// window is cut at the next start and no OFF window is emitted between them.
#[derive(Debug, Clone, Copy)]
pub struct SpillWindowBuilder {
    duration_ms: i64,
    horizon: Option<(i64, i64)>,
}

impl SpillWindowBuilder {
    pub fn new(duration_ms: i64) -> Result<Self, SpillWindowError> {
        if duration_ms <= 0 {
            return Err(SpillWindowError::ZeroDuration);
        }
        Ok(Self {
            duration_ms,
            horizon: None,
        })
    }

    /// Extend the windows with OFF periods so that `[min_ms, max_ms]` is fully covered
    pub fn with_horizon(mut self, min_ms: i64, max_ms: i64) -> Self {
        self.horizon = Some((min_ms.min(max_ms), min_ms.max(max_ms)));
        self
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// Build the ordered, contiguous window list. Input order and duplicates do not matter.
    pub fn build<I: IntoIterator<Item = i64>>(&self, clocks: I) -> Vec<SpillWindow> {
        let mut starts: Vec<i64> = clocks.into_iter().collect();
        starts.sort_unstable();
        starts.dedup();

        let mut windows: Vec<SpillWindow> = Vec::with_capacity(starts.len() * 2 + 2);

        let Some(&first) = starts.first() else {
            spdlog::warn!("No spill extractions available; every record will be classified OFF");
            if let Some((min_ms, max_ms)) = self.horizon {
                windows.push(SpillWindow::new(min_ms, max_ms + 1, SpillState::Off));
            }
            return windows;
        };

        if let Some((min_ms, _)) = self.horizon {
            if min_ms < first {
                windows.push(SpillWindow::new(min_ms, first, SpillState::Off));
            }
        }

        for (idx, &start) in starts.iter().enumerate() {
            let on_end = start + self.duration_ms;
            match starts.get(idx + 1) {
                Some(&next) if next <= on_end => {
                    windows.push(SpillWindow::new(start, next, SpillState::On));
                }
                Some(&next) => {
                    windows.push(SpillWindow::new(start, on_end, SpillState::On));
                    windows.push(SpillWindow::new(on_end, next, SpillState::Off));
                }
                None => {
                    windows.push(SpillWindow::new(start, on_end, SpillState::On));
                    if let Some((_, max_ms)) = self.horizon {
                        if max_ms >= on_end {
                            windows.push(SpillWindow::new(on_end, max_ms + 1, SpillState::Off));
                        }
                    }
                }
            }
        }

        if let (Some(w0), Some(wn)) = (windows.first(), windows.last()) {
            spdlog::info!(
                "Built {} spill windows covering {} to {}",
                windows.len(),
                utc_string(w0.start_ms),
                utc_string(wn.end_ms)
            );
        }

        windows
    }
}

use std::fmt::Display;
use std::ops::AddAssign;

use super::extractor::ExtractorStats;

/// Counts reported to the user at the end of each command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub parsed: u64,
    pub skipped: u64,
    pub filtered_out: u64,
    pub on: u64,
    pub off: u64,
    pub rendered: u64,
    pub render_failed: u64,
}

impl RunSummary {
    pub fn add_extraction(&mut self, stats: &ExtractorStats) {
        self.parsed += stats.parsed;
        self.skipped += stats.skipped;
        self.filtered_out += stats.filtered_out;
    }
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.parsed += rhs.parsed;
        self.skipped += rhs.skipped;
        self.filtered_out += rhs.filtered_out;
        self.on += rhs.on;
        self.off += rhs.off;
        self.rendered += rhs.rendered;
        self.render_failed += rhs.render_failed;
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parsed: {} skipped: {} other trigger types: {} spill ON: {} spill OFF: {} rendered: {} render failures: {}",
            self.parsed,
            self.skipped,
            self.filtered_out,
            self.on,
            self.off,
            self.rendered,
            self.render_failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate() {
        let mut total = RunSummary::default();
        total.add_extraction(&ExtractorStats {
            parsed: 3,
            skipped: 1,
            filtered_out: 2,
            primitives: 10,
            skipped_primitives: 0,
        });
        total += RunSummary {
            rendered: 2,
            render_failed: 1,
            ..Default::default()
        };
        assert_eq!(total.parsed, 3);
        assert_eq!(total.rendered, 2);
        assert!(total.to_string().contains("render failures: 1"));
    }
}

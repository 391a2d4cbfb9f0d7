//! Scan session bookkeeping

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for one scan pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files: usize,
    pub directories: usize,
    pub archives_reused: usize,
    pub archives_rebuilt: usize,
    pub archives_failed: usize,
    /// Generated `<dir>.zip` artifacts left out of the file list.
    pub skipped_artifacts: usize,
    /// Entries dropped because of an error.
    pub skipped_entries: usize,
}

/// Scan session record
#[derive(Debug, Clone, Serialize)]
pub struct ScanSession {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stats: ScanStats,
}

impl ScanSession {
    /// Start a new scan session
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            stats: ScanStats::default(),
        }
    }

    /// Mark session as finished
    pub fn finish(mut self, stats: ScanStats) -> Self {
        self.finished_at = Some(Utc::now());
        self.stats = stats;
        self
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_records_stats() {
        let session = ScanSession::start();
        assert!(session.elapsed_ms().is_none());

        let stats = ScanStats {
            files: 3,
            archives_rebuilt: 1,
            ..Default::default()
        };
        let session = session.finish(stats.clone());
        assert_eq!(session.stats, stats);
        assert!(session.elapsed_ms().unwrap() >= 0);
    }
}

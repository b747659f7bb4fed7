//! In-memory call history
//!
//! Recent calls for the console's call list, newest first. Kept in memory
//! only; history does not survive a restart.

use chrono::Local;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

/// One line of the call list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub direction: CallDirection,
    /// Local wall-clock time the call was logged, "HH:MM"
    pub time: String,
    pub name: String,
    pub number: String,
}

#[derive(Debug, Default)]
pub struct CallLog {
    records: RwLock<Vec<CallRecord>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a call now; newest entries go to the front.
    pub fn record(&self, direction: CallDirection, name: impl Into<String>, number: impl Into<String>) {
        let record = CallRecord {
            direction,
            time: Local::now().format("%H:%M").to_string(),
            name: name.into(),
            number: number.into(),
        };
        self.records.write().insert(0, record);
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.records.read().clone()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_record_first() {
        let log = CallLog::new();
        log.record(CallDirection::Incoming, "EDDF_TWR", "119.900");
        log.record(CallDirection::Outgoing, "EDDM_APP", "123.900");

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "EDDM_APP");
        assert_eq!(records[0].direction, CallDirection::Outgoing);
        assert_eq!(records[1].name, "EDDF_TWR");
    }

    #[test]
    fn test_clear_empties_log() {
        let log = CallLog::new();
        log.record(CallDirection::Incoming, "EDDF_TWR", "119.900");
        log.clear();
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_time_format() {
        let log = CallLog::new();
        log.record(CallDirection::Incoming, "x", "y");
        let time = &log.records()[0].time;
        assert_eq!(time.len(), 5);
        assert_eq!(time.as_bytes()[2], b':');
    }
}

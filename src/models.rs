//! Core data models for lyrics canonicalization.
//!
//! This module contains the record types that flow through the pipeline,
//! the group index used while bucketing, and run statistics.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Index mapping a normalized title key to its group index in `Vec<Group>`.
/// Groups live in a Vec so they keep the order their key was first seen.
pub type GroupIndex = FxHashMap<String, usize>;

// ============================================================================
// Records
// ============================================================================

/// Unprocessed song entry as returned by the provider (title + full lyrics text).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    pub lyrics: String,
}

impl RawRecord {
    pub fn new(title: impl Into<String>, lyrics: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lyrics: lyrics.into(),
        }
    }
}

/// Deduplicated, cleaned output entry (original title + 1 to 5 lyric lines).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub title: String,
    pub lyrics: Vec<String>,
}

/// Raw records sharing one normalized title key, in input order.
/// Never empty: a group is only created when its first record arrives.
#[derive(Clone, Debug)]
pub struct Group {
    pub key: String,
    pub records: Vec<RawRecord>,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Counters for one canonicalization run.
#[derive(Default, Debug, Clone, Serialize)]
pub struct PipelineStats {
    // Filter & Group
    pub input_records: usize,
    pub excluded_jordan_lake: usize,
    pub excluded_instrumental: usize,
    pub groups: usize,
    pub merged_variants: usize, // grouped records that were not selected

    // Select & Clean
    pub dropped_empty_lyrics: usize,
    pub canonical_records: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl PipelineStats {
    pub fn excluded(&self) -> usize {
        self.excluded_jordan_lake + self.excluded_instrumental
    }

    /// Records that survived exclusion and were bucketed into a group.
    pub fn grouped_records(&self) -> usize {
        self.input_records.saturating_sub(self.excluded())
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_derived_counts() {
        let stats = PipelineStats {
            input_records: 10,
            excluded_jordan_lake: 2,
            excluded_instrumental: 1,
            ..Default::default()
        };
        assert_eq!(stats.excluded(), 3);
        assert_eq!(stats.grouped_records(), 7);
    }

    #[test]
    fn test_grouped_records_never_underflows() {
        // Hand-built stats may carry exclusions without inputs
        let stats = PipelineStats {
            excluded_instrumental: 2,
            ..Default::default()
        };
        assert_eq!(stats.grouped_records(), 0);
    }

    #[test]
    fn test_write_stats_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let stats = PipelineStats {
            input_records: 4,
            canonical_records: 3,
            ..Default::default()
        };
        stats.write_to_file(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["input_records"], 4);
        assert_eq!(written["canonical_records"], 3);
    }
}

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SimError;

/// Block accounting for the simulated disk.
///
/// Block counts are signed; zero and negative inputs flow through the
/// arithmetic unvalidated. `metadata_blocks` and `cached_blocks` appear in
/// every stats payload but no operation updates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskState {
    pub total_blocks: i64,
    pub used_blocks: i64,
    pub free_blocks: i64,
    pub metadata_blocks: i64,
    pub bad_blocks: i64,
    pub cached_blocks: i64,
    pub files: Vec<FileRecord>,
}

impl DiskState {
    pub fn with_capacity(capacity: i64) -> Self {
        Self {
            total_blocks: capacity,
            used_blocks: 0,
            free_blocks: capacity,
            metadata_blocks: 0,
            bad_blocks: 0,
            cached_blocks: 0,
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub size: i64,
    pub parent_id: String,
    pub created_at: DateTime<Utc>,
}

/// A caller-supplied metrics sample, echoed back verbatim from the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub timestamp: String,
    pub read_speed: f64,
    pub write_speed: f64,
    pub cache_hit_rate: f64,
    pub fragmentation: f64,
}

/// Display-only metrics. Speeds and operation counts are random draws with
/// no relationship to the operations actually performed on the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub read_speed: f64,
    pub write_speed: f64,
    pub cache_hit_rate: f64,
    pub fragmentation: f64,
    pub operation_count: OperationCount,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationCount {
    pub create: u32,
    pub read: u32,
    pub write: u32,
    pub delete: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrashSeverity {
    Minor,
    Major,
    Catastrophic,
}

impl CrashSeverity {
    /// Inclusive range of blocks a crash of this severity marks bad.
    pub fn block_range(&self) -> RangeInclusive<i64> {
        match self {
            CrashSeverity::Minor => 3..=8,
            CrashSeverity::Major => 10..=20,
            CrashSeverity::Catastrophic => 25..=40,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrashSeverity::Minor => "minor",
            CrashSeverity::Major => "major",
            CrashSeverity::Catastrophic => "catastrophic",
        }
    }
}

impl fmt::Display for CrashSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrashSeverity {
    type Err = SimError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "minor" => Ok(CrashSeverity::Minor),
            "major" => Ok(CrashSeverity::Major),
            "catastrophic" => Ok(CrashSeverity::Catastrophic),
            other => Err(SimError::InvalidSeverity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrashReport {
    pub severity: CrashSeverity,
    pub affected_blocks: i64,
    pub total_bad_blocks: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryReport {
    pub recovered_blocks: i64,
    pub lost_blocks: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefragReport {
    pub before_fragmentation: f64,
    pub after_fragmentation: f64,
    pub improvement: f64,
}

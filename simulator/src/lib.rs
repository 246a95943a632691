mod demos;
mod engine;
mod state;

pub use demos::{demo_catalog, validate_demo, DemoInfo};
pub use engine::DiskLedger;
pub use state::{
    CrashReport, CrashSeverity, DefragReport, DiskState, FileRecord, OperationCount,
    PerformanceMetrics, PerformanceRecord, RecoveryReport,
};

/// Capacity in blocks for a freshly reset disk.
pub const DEFAULT_CAPACITY: i64 = 256;

/// Maximum number of retained performance history entries.
pub const HISTORY_CAP: usize = 50;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Not enough free blocks")]
    InsufficientSpace { requested: i64, free: i64 },

    #[error("File not found")]
    FileNotFound(String),

    #[error("Invalid severity level")]
    InvalidSeverity(String),

    #[error("Demo not found")]
    UnknownDemo(String),
}

use std::collections::VecDeque;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock};

use crate::state::{
    CrashReport, CrashSeverity, DefragReport, DiskState, FileRecord, OperationCount,
    PerformanceMetrics, PerformanceRecord, RecoveryReport,
};
use crate::{Result, SimError, DEFAULT_CAPACITY, HISTORY_CAP};

/// The process-wide resource ledger behind the whole API.
///
/// All read-modify-write sequences take a single write lock, so concurrent
/// handlers serialize on the state they touch. The RNG sits behind its own
/// lock and is seedable for deterministic tests.
pub struct DiskLedger {
    state: RwLock<DiskState>,
    history: RwLock<VecDeque<PerformanceRecord>>,
    rng: Mutex<StdRng>,
}

impl DiskLedger {
    pub fn new(capacity: i64) -> Self {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    pub fn with_seed(capacity: i64, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: i64, rng: StdRng) -> Self {
        Self {
            state: RwLock::new(DiskState::with_capacity(capacity)),
            history: RwLock::new(VecDeque::new()),
            rng: Mutex::new(rng),
        }
    }

    pub async fn stats(&self) -> DiskState {
        self.state.read().await.clone()
    }

    /// Replaces the ledger wholesale. Capacity is taken as-is, unvalidated.
    /// Performance history is left alone; only `reset` clears it.
    pub async fn initialize(&self, capacity: i64) {
        let mut state = self.state.write().await;
        *state = DiskState::with_capacity(capacity);
        tracing::info!("Disk initialized with {} blocks", capacity);
    }

    pub async fn reset(&self) {
        self.initialize(DEFAULT_CAPACITY).await;
        self.history.write().await.clear();
        tracing::info!("Disk and performance history reset");
    }

    pub async fn create_file(
        &self,
        name: &str,
        size: i64,
        parent_id: Option<String>,
    ) -> Result<FileRecord> {
        let mut state = self.state.write().await;
        if state.free_blocks < size {
            return Err(SimError::InsufficientSpace {
                requested: size,
                free: state.free_blocks,
            });
        }

        state.used_blocks += size;
        state.free_blocks -= size;

        // Ids derive from the current file count, so a delete followed by a
        // create can hand out an id that is still present in the list.
        let record = FileRecord {
            id: format!("file-{}", state.files.len() + 1),
            name: name.to_string(),
            size,
            parent_id: parent_id.unwrap_or_else(|| "root".to_string()),
            created_at: Utc::now(),
        };
        state.files.push(record.clone());
        tracing::info!("Created file {} ({} blocks)", record.id, size);

        Ok(record)
    }

    pub async fn list_files(&self) -> Vec<FileRecord> {
        self.state.read().await.files.clone()
    }

    /// Removes the first record matching `file_id` and returns its blocks
    /// to the free pool.
    pub async fn delete_file(&self, file_id: &str) -> Result<FileRecord> {
        let mut state = self.state.write().await;
        let position = state
            .files
            .iter()
            .position(|f| f.id == file_id)
            .ok_or_else(|| SimError::FileNotFound(file_id.to_string()))?;

        let record = state.files.remove(position);
        state.used_blocks -= record.size;
        state.free_blocks += record.size;
        tracing::info!("Deleted file {} ({} blocks)", record.id, record.size);

        Ok(record)
    }

    /// Synthetic fragmentation estimate: more files at a given usage ratio
    /// read as more fragmentation. Never stored, always recomputed.
    pub async fn fragmentation(&self) -> f64 {
        fragmentation_of(&*self.state.read().await)
    }

    pub async fn sample_metrics(&self) -> PerformanceMetrics {
        let fragmentation = self.fragmentation().await;
        let mut rng = self.rng.lock().await;

        PerformanceMetrics {
            read_speed: round1(rng.gen_range(70.0..=95.0)),
            write_speed: round1(rng.gen_range(50.0..=80.0)),
            cache_hit_rate: round1(rng.gen_range(65.0..=85.0)),
            fragmentation,
            operation_count: OperationCount {
                create: rng.gen_range(40..=50),
                read: rng.gen_range(150..=200),
                write: rng.gen_range(60..=90),
                delete: rng.gen_range(20..=30),
            },
            timestamp: Utc::now(),
        }
    }

    pub async fn record_metrics(&self, record: PerformanceRecord) {
        let mut history = self.history.write().await;
        history.push_back(record);
        if history.len() > HISTORY_CAP {
            history.pop_front();
        }
    }

    pub async fn history(&self) -> Vec<PerformanceRecord> {
        self.history.read().await.iter().cloned().collect()
    }

    /// Marks a severity-dependent random number of blocks bad, capped at
    /// the currently used count so `used_blocks` cannot go negative.
    pub async fn simulate_crash(&self, severity: CrashSeverity) -> CrashReport {
        let mut state = self.state.write().await;
        let draw = self.rng.lock().await.gen_range(severity.block_range());
        let affected = draw.min(state.used_blocks);

        state.bad_blocks += affected;
        state.used_blocks -= affected;
        tracing::warn!(
            "Simulated {} crash: {} blocks marked bad ({} total)",
            severity,
            affected,
            state.bad_blocks
        );

        CrashReport {
            severity,
            affected_blocks: affected,
            total_bad_blocks: state.bad_blocks,
        }
    }

    /// Returns 80% of the bad blocks to use and 20% to the free pool.
    /// Both shares floor independently, so up to one block can vanish.
    pub async fn run_recovery(&self) -> RecoveryReport {
        let mut state = self.state.write().await;
        let bad = state.bad_blocks;
        let recovered = bad * 8 / 10;
        let lost = bad * 2 / 10;

        state.used_blocks += recovered;
        state.free_blocks += lost;
        state.bad_blocks = 0;
        tracing::info!("Recovery complete: {} recovered, {} lost", recovered, lost);

        RecoveryReport {
            recovered_blocks: recovered,
            lost_blocks: lost,
        }
    }

    /// Reports a before/after pair without touching the ledger; the next
    /// fragmentation read recomputes from the formula as usual.
    pub async fn defragment(&self) -> DefragReport {
        let before = self.fragmentation().await;
        let after = round1(self.rng.lock().await.gen_range(0.0..=10.0));

        DefragReport {
            before_fragmentation: before,
            after_fragmentation: after,
            improvement: round1(before - after),
        }
    }
}

fn fragmentation_of(state: &DiskState) -> f64 {
    if state.used_blocks == 0 {
        return 0.0;
    }

    let usage_ratio = state.used_blocks as f64 / state.total_blocks as f64;
    let estimate = usage_ratio * state.files.len() as f64 * 5.0;
    round1(estimate.min(100.0))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(tag: &str) -> PerformanceRecord {
        PerformanceRecord {
            timestamp: tag.to_string(),
            read_speed: 80.0,
            write_speed: 60.0,
            cache_hit_rate: 70.0,
            fragmentation: 1.5,
        }
    }

    #[tokio::test]
    async fn create_and_delete_are_symmetric() {
        let ledger = DiskLedger::with_seed(100, 1);

        let record = ledger.create_file("a.txt", 30, None).await.unwrap();
        assert_eq!(record.id, "file-1");
        assert_eq!(record.name, "a.txt");
        assert_eq!(record.size, 30);
        assert_eq!(record.parent_id, "root");

        let stats = ledger.stats().await;
        assert_eq!(stats.used_blocks, 30);
        assert_eq!(stats.free_blocks, 70);

        ledger.delete_file("file-1").await.unwrap();
        let stats = ledger.stats().await;
        assert_eq!(stats.used_blocks, 0);
        assert_eq!(stats.free_blocks, 100);
        assert!(stats.files.is_empty());
    }

    #[tokio::test]
    async fn create_beyond_free_blocks_leaves_state_unchanged() {
        let ledger = DiskLedger::with_seed(10, 1);
        ledger.create_file("a.txt", 4, None).await.unwrap();

        let err = ledger.create_file("b.txt", 7, None).await.unwrap_err();
        match err {
            SimError::InsufficientSpace { requested, free } => {
                assert_eq!(requested, 7);
                assert_eq!(free, 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let stats = ledger.stats().await;
        assert_eq!(stats.used_blocks, 4);
        assert_eq!(stats.free_blocks, 6);
        assert_eq!(stats.files.len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_file_is_not_found() {
        let ledger = DiskLedger::with_seed(100, 1);
        let err = ledger.delete_file("file-9").await.unwrap_err();
        assert!(matches!(err, SimError::FileNotFound(_)));
        assert_eq!(ledger.stats().await.free_blocks, 100);
    }

    #[tokio::test]
    async fn file_ids_can_repeat_after_deletion() {
        let ledger = DiskLedger::with_seed(100, 1);
        ledger.create_file("a.txt", 5, None).await.unwrap();
        ledger.create_file("b.txt", 5, None).await.unwrap();
        ledger.delete_file("file-1").await.unwrap();

        let dup = ledger.create_file("c.txt", 5, None).await.unwrap();
        assert_eq!(dup.id, "file-2");

        // First match wins: b.txt goes, c.txt stays under the same id.
        let removed = ledger.delete_file("file-2").await.unwrap();
        assert_eq!(removed.name, "b.txt");
        let files = ledger.list_files().await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "c.txt");
    }

    #[tokio::test]
    async fn initialize_replaces_the_ledger() {
        let ledger = DiskLedger::with_seed(100, 1);
        ledger.create_file("a.txt", 30, None).await.unwrap();

        ledger.initialize(64).await;
        let stats = ledger.stats().await;
        assert_eq!(stats.total_blocks, 64);
        assert_eq!(stats.free_blocks, 64);
        assert_eq!(stats.used_blocks, 0);
        assert!(ledger.list_files().await.is_empty());
    }

    #[tokio::test]
    async fn initialize_keeps_history_but_reset_clears_it() {
        let ledger = DiskLedger::with_seed(100, 1);
        ledger.record_metrics(sample_record("t-0")).await;

        ledger.initialize(32).await;
        assert_eq!(ledger.history().await.len(), 1);

        ledger.reset().await;
        let stats = ledger.stats().await;
        assert_eq!(stats.total_blocks, DEFAULT_CAPACITY);
        assert_eq!(stats.free_blocks, DEFAULT_CAPACITY);
        assert!(ledger.history().await.is_empty());
    }

    #[tokio::test]
    async fn history_is_a_fifo_window_of_fifty() {
        let ledger = DiskLedger::with_seed(100, 1);
        for i in 0..51 {
            ledger.record_metrics(sample_record(&format!("t-{i}"))).await;
        }

        let history = ledger.history().await;
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0].timestamp, "t-1");
        assert_eq!(history[49].timestamp, "t-50");
    }

    #[tokio::test]
    async fn fragmentation_follows_the_formula() {
        let ledger = DiskLedger::with_seed(100, 1);
        assert_eq!(ledger.fragmentation().await, 0.0);

        ledger.create_file("a.txt", 25, None).await.unwrap();
        ledger.create_file("b.txt", 25, None).await.unwrap();
        // (50/100) * 2 files * 5 = 5.0
        assert_eq!(ledger.fragmentation().await, 5.0);

        ledger.create_file("c.txt", 10, None).await.unwrap();
        // (60/100) * 3 files * 5 = 9.0
        assert_eq!(ledger.fragmentation().await, 9.0);
    }

    #[tokio::test]
    async fn fragmentation_is_clamped_at_one_hundred() {
        let ledger = DiskLedger::with_seed(30, 1);
        for i in 0..30 {
            ledger.create_file(&format!("f{i}"), 1, None).await.unwrap();
        }
        // (30/30) * 30 files * 5 = 150, clamped
        assert_eq!(ledger.fragmentation().await, 100.0);
    }

    #[tokio::test]
    async fn metrics_draws_stay_inside_their_ranges() {
        let ledger = DiskLedger::with_seed(256, 7);
        for _ in 0..20 {
            let metrics = ledger.sample_metrics().await;
            assert!((70.0..=95.0).contains(&metrics.read_speed));
            assert!((50.0..=80.0).contains(&metrics.write_speed));
            assert!((65.0..=85.0).contains(&metrics.cache_hit_rate));
            assert!((40..=50).contains(&metrics.operation_count.create));
            assert!((150..=200).contains(&metrics.operation_count.read));
            assert!((60..=90).contains(&metrics.operation_count.write));
            assert!((20..=30).contains(&metrics.operation_count.delete));
            assert_eq!(metrics.fragmentation, 0.0);
        }
    }

    #[tokio::test]
    async fn crash_damage_is_capped_at_used_blocks() {
        let ledger = DiskLedger::with_seed(100, 3);
        ledger.create_file("tiny.txt", 5, None).await.unwrap();

        // Catastrophic draws 25..=40, far above the 5 used blocks.
        let report = ledger.simulate_crash(CrashSeverity::Catastrophic).await;
        assert_eq!(report.affected_blocks, 5);
        assert_eq!(report.total_bad_blocks, 5);

        let stats = ledger.stats().await;
        assert_eq!(stats.used_blocks, 0);
        assert_eq!(stats.bad_blocks, 5);
    }

    #[tokio::test]
    async fn severity_parsing_rejects_unknown_levels() {
        assert_eq!("minor".parse::<CrashSeverity>().unwrap(), CrashSeverity::Minor);
        assert_eq!("major".parse::<CrashSeverity>().unwrap(), CrashSeverity::Major);
        assert_eq!(
            "catastrophic".parse::<CrashSeverity>().unwrap(),
            CrashSeverity::Catastrophic
        );
        assert!(matches!(
            "apocalyptic".parse::<CrashSeverity>(),
            Err(SimError::InvalidSeverity(_))
        ));
    }

    #[tokio::test]
    async fn recovery_floors_both_shares_independently() {
        let ledger = DiskLedger::with_seed(100, 5);
        ledger.create_file("a.txt", 50, None).await.unwrap();

        let crash = ledger.simulate_crash(CrashSeverity::Major).await;
        let bad = crash.affected_blocks;
        assert!((10..=20).contains(&bad));

        let report = ledger.run_recovery().await;
        assert_eq!(report.recovered_blocks, bad * 8 / 10);
        assert_eq!(report.lost_blocks, bad * 2 / 10);
        assert!(report.recovered_blocks + report.lost_blocks <= bad);

        let stats = ledger.stats().await;
        assert_eq!(stats.bad_blocks, 0);
        assert_eq!(stats.used_blocks, 50 - bad + report.recovered_blocks);
        assert_eq!(stats.free_blocks, 50 + report.lost_blocks);
    }

    #[tokio::test]
    async fn recovery_can_lose_a_block_to_rounding() {
        // 7 bad blocks: floor(5.6) + floor(1.4) = 5 + 1 = 6.
        assert_eq!(7 * 8 / 10 + 7 * 2 / 10, 6);
    }

    #[tokio::test]
    async fn defragment_reports_without_mutating() {
        let ledger = DiskLedger::with_seed(100, 9);
        ledger.create_file("a.txt", 40, None).await.unwrap();
        ledger.create_file("b.txt", 40, None).await.unwrap();
        let before = ledger.fragmentation().await;

        let report = ledger.defragment().await;
        assert_eq!(report.before_fragmentation, before);
        assert!((0.0..=10.0).contains(&report.after_fragmentation));
        assert_eq!(
            report.improvement,
            ((report.before_fragmentation - report.after_fragmentation) * 10.0).round() / 10.0
        );

        // Nothing persisted: the next read recomputes the same value.
        assert_eq!(ledger.fragmentation().await, before);
        let stats = ledger.stats().await;
        assert_eq!(stats.used_blocks, 80);
        assert_eq!(stats.free_blocks, 20);
    }

    #[tokio::test]
    async fn crash_then_recovery_scenario() {
        let ledger = DiskLedger::with_seed(100, 11);
        let record = ledger.create_file("a.txt", 30, None).await.unwrap();
        assert_eq!(record.id, "file-1");

        let crash = ledger.simulate_crash(CrashSeverity::Major).await;
        let affected = crash.affected_blocks;
        assert!((10..=20).contains(&affected));

        let stats = ledger.stats().await;
        assert_eq!(stats.used_blocks, 30 - affected);
        assert_eq!(stats.bad_blocks, affected);

        let recovery = ledger.run_recovery().await;
        let stats = ledger.stats().await;
        assert_eq!(stats.bad_blocks, 0);
        assert_eq!(stats.used_blocks, 30 - affected + recovery.recovered_blocks);
        assert_eq!(stats.free_blocks, 70 + recovery.lost_blocks);
    }
}

use serde::Serialize;

use crate::{Result, SimError};

#[derive(Debug, Clone, Serialize)]
pub struct DemoInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub duration: &'static str,
}

/// Demo scenarios shown in the catalog. Nothing executes; the frontend
/// drives the actual walkthrough.
pub fn demo_catalog() -> Vec<DemoInfo> {
    vec![
        DemoInfo {
            id: "basic-ops",
            name: "Basic File Operations",
            description: "Create, read, and delete files",
            duration: "3 min",
        },
        DemoInfo {
            id: "fragmentation",
            name: "Fragmentation Demo",
            description: "See how fragmentation affects performance",
            duration: "4 min",
        },
        DemoInfo {
            id: "crash-recovery",
            name: "Crash & Recovery",
            description: "Simulate crash and recovery process",
            duration: "5 min",
        },
    ]
}

// The run set is wider than the catalog: two ids are accepted but unlisted.
const RUNNABLE_DEMOS: [&str; 5] = [
    "basic-ops",
    "fragmentation",
    "crash-recovery",
    "performance",
    "comparison",
];

pub fn validate_demo(id: &str) -> Result<()> {
    if RUNNABLE_DEMOS.contains(&id) {
        Ok(())
    } else {
        Err(SimError::UnknownDemo(id.to_string()))
    }
}

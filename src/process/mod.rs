//! Process-related modules for reading the process table and classifying
//! processes into containers.
//!
//! This module provides:
//! - `record`: Per-scan process snapshot types
//! - `table`: The `ProcessTable` provider trait and the in-memory snapshot table
//! - `procfs`: Process table provider backed by /proc
//! - `classifier`: Namespace and cgroup classification strategies
//! - `identifier`: Container id and dedup key derivation

pub mod classifier;
pub mod identifier;
pub mod procfs;
pub mod record;
pub mod table;

// Re-export commonly used types
pub use classifier::{
    CgroupClassifier, ContainerClassifier, NamespaceClassifier, Sighting, Strategy,
    DEFAULT_CGROUP_MARKERS, DEFAULT_CGROUP_READ_LIMIT,
};
pub use identifier::{
    cgroup_container_id, cgroup_container_id_or_unknown, format_namespace_id,
    namespace_container_id, ContainerKey, UNKNOWN_ID,
};
pub use procfs::{collect_proc_entries, read_process_name, ProcFs, DEFAULT_PROC_ROOT};
pub use record::{NamespaceIds, ProcessRecord, TASK_COMM_LEN};
pub use table::{ProcessTable, RootNamespaces, SnapshotData, SnapshotProcess, SnapshotTable};

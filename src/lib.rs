//! Herakles Container Census Library
//!
//! This library walks the Linux process table, decides which processes run
//! inside containers and keeps one representative process per container.
//! It is independent of the command-line frontend, so the census can be
//! embedded into other agents or driven from a recorded snapshot.
//!
//! # Features
//!
//! - **Two Classifiers**: namespace comparison against the host root
//!   namespaces, or runtime markers in `/proc/<pid>/cgroup`
//! - **Bounded Dedup**: at most `max_containers` records, lowest pid wins
//! - **Pluggable Process Table**: `/proc` or an in-memory snapshot
//! - **Renderers**: fixed-width table, JSON and YAML
//!
//! # Usage
//!
//! ```rust
//! use herakles_container_census::{
//!     render_table, Census, NamespaceIds, ProcessRecord, RootNamespaces, SnapshotTable,
//! };
//!
//! let table = SnapshotTable::new(RootNamespaces { pid: 4026531836, net: 4026531840 });
//! let ns = NamespaceIds { pid: Some(0xABCD1234), pid_for_children: Some(0xABCD1234), net: 7 };
//! table.insert(ProcessRecord::new(500, 480, "worker", Some(ns)), None);
//! table.insert(ProcessRecord::new(200, 180, "nginx", Some(ns)), None);
//!
//! let scan = Census::default().run(&table).expect("scan");
//! assert_eq!(scan.containers[0].pid, 200);
//! assert_eq!(scan.containers[0].container_id, "abcd123400c8");
//!
//! for line in render_table(&scan) {
//!     println!("{}", line);
//! }
//! ```

pub mod census;
pub mod error;
pub mod process;
pub mod render;

// Re-export main types for convenience
pub use census::{
    should_include_process, BoundPolicy, Census, CensusSettings, ContainerRecord, ContainerSet,
    Observation, Scan, ScanStats, Truncation, DEFAULT_MAX_CONTAINERS,
};
pub use error::CensusError;
pub use process::{
    ContainerClassifier, ContainerKey, NamespaceIds, ProcFs, ProcessRecord, ProcessTable,
    RootNamespaces, SnapshotData, SnapshotProcess, SnapshotTable, Strategy, UNKNOWN_ID,
};
pub use render::{render, render_table, OutputFormat, EMPTY_ADVISORY};

//! Error types for the container census.
//!
//! Every per-process variant is local and non-fatal: the census degrades it to
//! "not containerized" or to an `"unknown"` identifier and keeps walking.
//! Only [`CensusError::ProcessTableUnavailable`] aborts a scan.

use std::collections::TryReserveError;

#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    #[error("pid {pid}: namespace data not available")]
    MissingNamespaceData { pid: u32 },

    #[error("container id extraction failed: {reason}")]
    IdentifierExtraction { reason: &'static str },

    #[error("pid {pid}: failed to open cgroup membership: {source}")]
    MembershipOpen {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("pid {pid}: failed to read cgroup membership: {source}")]
    MembershipRead {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to allocate {requested} byte scratch buffer: {source}")]
    ScratchAllocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("process table unavailable: {0}")]
    ProcessTableUnavailable(String),
}

//! Process-table providers.
//!
//! The census never touches `/proc` directly; it goes through [`ProcessTable`]
//! so that the walk, the classifiers and the identifier extraction can run
//! against a live system ([`crate::process::ProcFs`]) or an in-memory snapshot
//! ([`SnapshotTable`]).

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

use crate::error::CensusError;
use crate::process::record::ProcessRecord;

/// Namespace inodes of the host's root namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootNamespaces {
    pub pid: u64,
    pub net: u64,
}

/// Source of process records and per-process cgroup membership text.
pub trait ProcessTable {
    /// Returns every live process.
    ///
    /// Any read-side lock the provider needs is held only for the duration of
    /// this call. Callers perform blocking per-process reads afterwards.
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, CensusError>;

    /// Root PID and network namespaces the classifiers compare against.
    fn root_namespaces(&self) -> Result<RootNamespaces, CensusError>;

    /// Reads at most `cap` bytes of the process's cgroup membership text.
    fn read_membership(&self, pid: u32, cap: usize) -> Result<Vec<u8>, CensusError>;
}

/// Process entry of a snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProcess {
    #[serde(flatten)]
    pub record: ProcessRecord,
    /// Content of `/proc/<pid>/cgroup`; `None` models an unreadable file.
    #[serde(default)]
    pub cgroup: Option<String>,
}

/// Root structure of a snapshot JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    pub version: String,
    pub generated_at: String,
    pub root: RootNamespaces,
    pub processes: Vec<SnapshotProcess>,
}

/// In-memory process table.
///
/// Writers may replace processes concurrently with a running scan; a scan sees
/// the table as it was when [`ProcessTable::snapshot`] took the read lock.
pub struct SnapshotTable {
    root: RootNamespaces,
    processes: RwLock<Vec<ProcessRecord>>,
    membership: RwLock<HashMap<u32, String>>,
}

impl SnapshotTable {
    pub fn new(root: RootNamespaces) -> Self {
        Self {
            root,
            processes: RwLock::new(Vec::new()),
            membership: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a process, optionally with its cgroup membership text.
    pub fn insert(&self, record: ProcessRecord, cgroup: Option<&str>) {
        let pid = record.pid;
        if let Ok(mut procs) = self.processes.write() {
            procs.retain(|p| p.pid != pid);
            procs.push(record);
        }
        if let Ok(mut membership) = self.membership.write() {
            match cgroup {
                Some(text) => {
                    membership.insert(pid, text.to_string());
                }
                None => {
                    membership.remove(&pid);
                }
            }
        }
    }

    /// Removes a process, as if it exited.
    pub fn remove(&self, pid: u32) {
        if let Ok(mut procs) = self.processes.write() {
            procs.retain(|p| p.pid != pid);
        }
        if let Ok(mut membership) = self.membership.write() {
            membership.remove(&pid);
        }
    }

    pub fn len(&self) -> usize {
        self.processes.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a table from parsed snapshot data.
    pub fn from_data(data: SnapshotData) -> Self {
        let table = Self::new(data.root);
        for proc in data.processes {
            table.insert(proc.record, proc.cgroup.as_deref());
        }
        table
    }

    /// Loads a snapshot JSON file, e.g. one written by `generate-snapshot`.
    pub fn load(path: &Path) -> Result<Self, String> {
        debug!("Loading process snapshot from: {}", path.display());

        if !path.exists() {
            return Err(format!("Snapshot file not found: {}", path.display()));
        }

        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read snapshot file: {}", e))?;
        let data: SnapshotData = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse snapshot JSON: {}", e))?;

        info!(
            "Loaded snapshot version {} from {} ({} processes)",
            data.version,
            data.generated_at,
            data.processes.len()
        );

        Ok(Self::from_data(data))
    }
}

impl ProcessTable for SnapshotTable {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, CensusError> {
        let guard = self
            .processes
            .read()
            .map_err(|_| CensusError::ProcessTableUnavailable("snapshot lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn root_namespaces(&self) -> Result<RootNamespaces, CensusError> {
        Ok(self.root)
    }

    fn read_membership(&self, pid: u32, cap: usize) -> Result<Vec<u8>, CensusError> {
        let text = {
            let guard = self.membership.read().map_err(|_| CensusError::MembershipOpen {
                pid,
                source: io::Error::other("membership lock poisoned"),
            })?;
            guard.get(&pid).cloned()
        };
        let text = text.ok_or_else(|| CensusError::MembershipOpen {
            pid,
            source: io::Error::from(io::ErrorKind::NotFound),
        })?;
        let bytes = text.as_bytes();
        Ok(bytes[..bytes.len().min(cap)].to_vec())
    }
}

//! Container classification strategies.
//!
//! Two interchangeable strategies decide whether a process runs inside a
//! container and, if so, which container it belongs to:
//!
//! - [`NamespaceClassifier`]: child PID namespace and network namespace both
//!   differ from the host root namespaces. Approximate; it does not check for
//!   a specific runtime.
//! - [`CgroupClassifier`]: the cgroup membership text contains a known
//!   container runtime marker.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::process::identifier::{
    cgroup_container_id_or_unknown, cgroup_key, find, namespace_container_id, ContainerKey,
    UNKNOWN_ID,
};
use crate::process::record::ProcessRecord;
use crate::process::table::{ProcessTable, RootNamespaces};

/// Runtime markers searched for in cgroup membership text.
pub const DEFAULT_CGROUP_MARKERS: [&str; 4] = ["/docker/", "docker-", ".scope", "container"];

/// Bytes of membership text read per process (content beyond is ignored).
pub const DEFAULT_CGROUP_READ_LIMIT: usize = 1023;

/// Classification strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Namespace,
    Cgroup,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Namespace => write!(f, "namespace"),
            Strategy::Cgroup => write!(f, "cgroup"),
        }
    }
}

/// A process recognized as containerized, with its dedup key and display id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub key: ContainerKey,
    pub container_id: String,
}

/// Decides whether a single process snapshot is containerized.
pub trait ContainerClassifier {
    fn strategy(&self) -> Strategy;

    /// Classifies and identifies in one pass; `None` means "not containerized".
    fn identify(&self, process: &ProcessRecord) -> Option<Sighting>;

    fn is_container_process(&self, process: &ProcessRecord) -> bool {
        self.identify(process).is_some()
    }
}

/// Namespace-based strategy.
#[derive(Debug, Clone)]
pub struct NamespaceClassifier {
    root: RootNamespaces,
}

impl NamespaceClassifier {
    pub fn new(root: RootNamespaces) -> Self {
        Self { root }
    }
}

impl ContainerClassifier for NamespaceClassifier {
    fn strategy(&self) -> Strategy {
        Strategy::Namespace
    }

    fn identify(&self, process: &ProcessRecord) -> Option<Sighting> {
        let ns = process.namespaces?;
        let pid_ns = ns.pid_for_children?;
        if pid_ns == self.root.pid || ns.net == self.root.net {
            return None;
        }

        let container_id = namespace_container_id(process).unwrap_or_else(|e| {
            debug!("{}", e);
            UNKNOWN_ID.to_string()
        });
        Some(Sighting {
            key: ContainerKey::Namespace(pid_ns),
            container_id,
        })
    }
}

/// Cgroup-membership-based strategy.
pub struct CgroupClassifier<'a> {
    table: &'a dyn ProcessTable,
    root_pid_ns: Option<u64>,
    markers: Vec<String>,
    read_limit: usize,
}

impl<'a> CgroupClassifier<'a> {
    pub fn new(
        table: &'a dyn ProcessTable,
        root_pid_ns: Option<u64>,
        markers: Vec<String>,
        read_limit: usize,
    ) -> Self {
        Self {
            table,
            root_pid_ns,
            markers,
            read_limit,
        }
    }

    /// Marker-based check on already-read membership text.
    pub fn matches_markers(&self, text: &[u8]) -> bool {
        self.markers.iter().any(|m| find(text, m.as_bytes()).is_some())
    }

    fn in_root_pid_ns(&self, process: &ProcessRecord) -> bool {
        match (self.root_pid_ns, process.namespaces.and_then(|ns| ns.pid)) {
            (Some(root), Some(own)) => root == own,
            _ => false,
        }
    }
}

impl ContainerClassifier for CgroupClassifier<'_> {
    fn strategy(&self) -> Strategy {
        Strategy::Cgroup
    }

    fn identify(&self, process: &ProcessRecord) -> Option<Sighting> {
        if self.in_root_pid_ns(process) {
            return None;
        }

        // Scratch buffer is dropped when this function returns
        let text = match self.table.read_membership(process.pid, self.read_limit) {
            Ok(t) => t,
            Err(e) => {
                debug!("Treating pid {} as not containerized: {}", process.pid, e);
                return None;
            }
        };

        if !self.matches_markers(&text) {
            return None;
        }

        Some(Sighting {
            key: cgroup_key(&text, &self.markers),
            container_id: cgroup_container_id_or_unknown(&text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::record::NamespaceIds;
    use crate::process::table::SnapshotTable;

    const ROOT: RootNamespaces = RootNamespaces {
        pid: 4026531836,
        net: 4026531840,
    };

    fn default_markers() -> Vec<String> {
        DEFAULT_CGROUP_MARKERS.iter().map(|s| s.to_string()).collect()
    }

    fn proc_in(pid: u32, pid_ns: u64, net_ns: u64) -> ProcessRecord {
        ProcessRecord::new(
            pid,
            1,
            "app",
            Some(NamespaceIds {
                pid: Some(pid_ns),
                pid_for_children: Some(pid_ns),
                net: net_ns,
            }),
        )
    }

    // -------------------------------------------------------------------------
    // Namespace strategy
    // -------------------------------------------------------------------------

    #[test]
    fn test_namespace_classifier_container() {
        let c = NamespaceClassifier::new(ROOT);
        let sighting = c.identify(&proc_in(200, 0xABCD1234, 99)).unwrap();
        assert_eq!(sighting.key, ContainerKey::Namespace(0xABCD1234));
        assert_eq!(sighting.container_id, "abcd123400c8");
    }

    #[test]
    fn test_namespace_classifier_host_process() {
        let c = NamespaceClassifier::new(ROOT);
        assert!(!c.is_container_process(&proc_in(1, ROOT.pid, ROOT.net)));
    }

    #[test]
    fn test_namespace_classifier_requires_both_namespaces() {
        let c = NamespaceClassifier::new(ROOT);
        // own pid namespace but host network (e.g. --network host)
        assert!(!c.is_container_process(&proc_in(10, 77, ROOT.net)));
        // own network namespace but host pid namespace (e.g. ip netns exec)
        assert!(!c.is_container_process(&proc_in(11, ROOT.pid, 88)));
    }

    #[test]
    fn test_namespace_classifier_missing_namespace_data() {
        let c = NamespaceClassifier::new(ROOT);
        assert!(!c.is_container_process(&ProcessRecord::new(10, 1, "zombie", None)));

        let no_child = ProcessRecord::new(
            11,
            1,
            "app",
            Some(NamespaceIds {
                pid: Some(77),
                pid_for_children: None,
                net: 88,
            }),
        );
        assert!(!c.is_container_process(&no_child));
    }

    // -------------------------------------------------------------------------
    // Cgroup strategy
    // -------------------------------------------------------------------------

    #[test]
    fn test_cgroup_classifier_docker_path() {
        let table = SnapshotTable::new(ROOT);
        let p = proc_in(300, 77, 88);
        table.insert(p.clone(), Some("0::/docker/abcdef0123456789abcdef\n"));

        let c = CgroupClassifier::new(&table, Some(ROOT.pid), default_markers(), 1023);
        let sighting = c.identify(&p).unwrap();
        assert_eq!(sighting.container_id, "abcdef012345");
        assert_eq!(
            sighting.key,
            ContainerKey::Cgroup("/docker/abcdef0123456789abcdef".into())
        );
    }

    #[test]
    fn test_cgroup_classifier_systemd_scope_unknown_id() {
        let table = SnapshotTable::new(ROOT);
        let p = proc_in(300, 77, 88);
        table.insert(p.clone(), Some("0::/system.slice/docker-0123abcd.scope\n"));

        let c = CgroupClassifier::new(&table, Some(ROOT.pid), default_markers(), 1023);
        let sighting = c.identify(&p).unwrap();
        assert_eq!(sighting.container_id, UNKNOWN_ID);
    }

    #[test]
    fn test_cgroup_classifier_fast_negative_root_pid_ns() {
        let table = SnapshotTable::new(ROOT);
        let p = proc_in(300, ROOT.pid, ROOT.net);
        table.insert(p.clone(), Some("0::/docker/abcdef0123456789abcdef\n"));

        let c = CgroupClassifier::new(&table, Some(ROOT.pid), default_markers(), 1023);
        assert!(!c.is_container_process(&p));
    }

    #[test]
    fn test_cgroup_classifier_no_marker() {
        let table = SnapshotTable::new(ROOT);
        let p = proc_in(300, 77, 88);
        table.insert(p.clone(), Some("0::/user.slice/user-1000.slice\n"));

        let c = CgroupClassifier::new(&table, Some(ROOT.pid), default_markers(), 1023);
        assert!(!c.is_container_process(&p));
    }

    #[test]
    fn test_cgroup_classifier_unreadable_membership() {
        let table = SnapshotTable::new(ROOT);
        let p = proc_in(300, 77, 88);
        table.insert(p.clone(), None);

        let c = CgroupClassifier::new(&table, Some(ROOT.pid), default_markers(), 1023);
        assert!(!c.is_container_process(&p));
    }

    #[test]
    fn test_cgroup_classifier_marker_beyond_read_limit() {
        let table = SnapshotTable::new(ROOT);
        let p = proc_in(300, 77, 88);
        let text = format!("0::/{}/docker/abc\n", "x".repeat(1100));
        table.insert(p.clone(), Some(&text));

        let c = CgroupClassifier::new(&table, Some(ROOT.pid), default_markers(), 1023);
        assert!(!c.is_container_process(&p));
    }

    #[test]
    fn test_cgroup_classifier_without_namespace_data_reads_membership() {
        let table = SnapshotTable::new(ROOT);
        let p = ProcessRecord::new(300, 1, "app", None);
        table.insert(p.clone(), Some("0::/kubepods/container-1\n"));

        let c = CgroupClassifier::new(&table, Some(ROOT.pid), default_markers(), 1023);
        assert!(c.is_container_process(&p));
    }
}

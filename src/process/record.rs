//! Per-scan process snapshot types.

use serde::{Deserialize, Serialize};

/// Kernel `TASK_COMM_LEN`: 15 visible bytes plus the terminating NUL.
pub const TASK_COMM_LEN: usize = 16;

/// Namespace identities of a process, as inode numbers of `/proc/<pid>/ns/*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceIds {
    /// PID namespace the process itself lives in (`ns/pid`).
    #[serde(default)]
    pub pid: Option<u64>,
    /// PID namespace for children created by the process (`ns/pid_for_children`).
    #[serde(default)]
    pub pid_for_children: Option<u64>,
    /// Network namespace (`ns/net`).
    pub net: u64,
}

/// One entry of the process table, read once per scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    #[serde(default)]
    pub ppid: u32,
    pub comm: String,
    /// `None` when the process has no namespace proxy (exited, zombie, unreadable).
    #[serde(default)]
    pub namespaces: Option<NamespaceIds>,
}

impl ProcessRecord {
    pub fn new(pid: u32, ppid: u32, comm: &str, namespaces: Option<NamespaceIds>) -> Self {
        Self {
            pid,
            ppid,
            comm: truncate_comm(comm),
            namespaces,
        }
    }

    /// Inode of the child PID namespace, if known.
    pub fn pid_ns_for_children(&self) -> Option<u64> {
        self.namespaces.and_then(|ns| ns.pid_for_children)
    }
}

/// Bounds a command name to what the kernel keeps in `task->comm`.
pub fn truncate_comm(comm: &str) -> String {
    let max = TASK_COMM_LEN - 1;
    if comm.len() <= max {
        return comm.to_string();
    }
    let mut end = max;
    while !comm.is_char_boundary(end) {
        end -= 1;
    }
    comm[..end].to_string()
}

//! Process table provider backed by the /proc filesystem.
//!
//! Reads `stat`, `comm`, `ns/*` and `cgroup` below a configurable root so the
//! same code can be pointed at a fake tree in tests.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::CensusError;
use crate::process::record::{NamespaceIds, ProcessRecord};
use crate::process::table::{ProcessTable, RootNamespaces};

/// Default mount point of the proc filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Matches namespace link targets such as `pid:[4026531836]`.
static NS_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_]+:\[(\d+)\]$").expect("namespace link pattern is valid")
});

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Scans the proc root for process entries with numeric PIDs.
pub fn collect_proc_entries(root: &Path, max: Option<usize>) -> Vec<ProcEntry> {
    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let p = entry.path();
            let name = match p.file_name().and_then(|s| s.to_str()) {
                Some(v) => v,
                None => continue,
            };
            if !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if !p.join("stat").exists() {
                continue;
            }
            let pid: u32 = match name.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            out.push(ProcEntry { pid, proc_path: p });
            if let Some(maxp) = max {
                if out.len() >= maxp {
                    break;
                }
            }
        }
    }
    out
}

/// Reads the process name from the comm file.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    let comm = fs::read_to_string(proc_path.join("comm")).ok()?;
    Some(comm.trim_end_matches('\n').to_string())
}

/// Parses the parent pid (field 4) from the content of /proc/<pid>/stat.
///
/// The command name in field 2 may contain spaces and parentheses, so fields
/// are counted from the last `)`.
pub fn parse_ppid(stat: &str) -> Option<u32> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let _state = fields.next()?;
    fields.next()?.parse().ok()
}

/// Parses a namespace link target (`net:[4026531840]`) into its inode number.
pub fn parse_ns_link(target: &str) -> Option<u64> {
    NS_LINK_RE
        .captures(target.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Reads the inode of `/proc/<pid>/ns/<name>`.
pub fn read_ns_inode(proc_path: &Path, name: &str) -> Option<u64> {
    let target = fs::read_link(proc_path.join("ns").join(name)).ok()?;
    parse_ns_link(target.to_str()?)
}

/// Reads all namespace identities of a process.
///
/// Returns `None` when the network namespace cannot be resolved, which is what
/// the kernel reports for processes that already dropped their namespaces.
pub fn read_namespaces(proc_path: &Path) -> Option<NamespaceIds> {
    let net = read_ns_inode(proc_path, "net")?;
    // ns/pid_for_children is missing before Linux 4.12; such processes are
    // never classified by the namespace strategy
    Some(NamespaceIds {
        pid: read_ns_inode(proc_path, "pid"),
        pid_for_children: read_ns_inode(proc_path, "pid_for_children"),
        net,
    })
}

/// Reads up to `cap` bytes into a freshly allocated scratch buffer.
///
/// The buffer belongs to the caller; on error it is dropped before returning.
pub fn read_capped<R: Read>(reader: R, pid: u32, cap: usize) -> Result<Vec<u8>, CensusError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(cap)
        .map_err(|source| CensusError::ScratchAllocation {
            requested: cap,
            source,
        })?;
    reader
        .take(cap as u64)
        .read_to_end(&mut buf)
        .map_err(|source| CensusError::MembershipRead { pid, source })?;
    Ok(buf)
}

/// Live process table read from a proc filesystem mount.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_record(&self, entry: &ProcEntry) -> Option<ProcessRecord> {
        // comm disappears together with the process; treat that as "gone"
        let comm = read_process_name(&entry.proc_path)?;
        let ppid = fs::read_to_string(entry.proc_path.join("stat"))
            .ok()
            .and_then(|s| parse_ppid(&s))
            .unwrap_or(0);
        let namespaces = read_namespaces(&entry.proc_path);
        Some(ProcessRecord::new(entry.pid, ppid, &comm, namespaces))
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ProcessTable for ProcFs {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, CensusError> {
        if !self.root.is_dir() {
            return Err(CensusError::ProcessTableUnavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let entries = collect_proc_entries(&self.root, None);
        let mut records = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.read_record(entry) {
                Some(rec) => records.push(rec),
                None => trace!("pid {} vanished during snapshot", entry.pid),
            }
        }
        debug!(
            "Snapshot of {}: {} entries, {} readable",
            self.root.display(),
            entries.len(),
            records.len()
        );
        Ok(records)
    }

    fn root_namespaces(&self) -> Result<RootNamespaces, CensusError> {
        let init = self.root.join("1");
        let pid = read_ns_inode(&init, "pid");
        let net = read_ns_inode(&init, "net");
        match (pid, net) {
            (Some(pid), Some(net)) => Ok(RootNamespaces { pid, net }),
            _ => Err(CensusError::ProcessTableUnavailable(format!(
                "cannot resolve root namespaces from {}",
                init.join("ns").display()
            ))),
        }
    }

    fn read_membership(&self, pid: u32, cap: usize) -> Result<Vec<u8>, CensusError> {
        let path = self.root.join(pid.to_string()).join("cgroup");
        let file =
            fs::File::open(&path).map_err(|source| CensusError::MembershipOpen { pid, source })?;
        read_capped(file, pid, cap)
    }
}

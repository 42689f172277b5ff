//! Generate snapshot command implementation.
//!
//! Generates synthetic process snapshot JSON files for testing scans without
//! a live container runtime.

use chrono::Utc;
use herakles_container_census::{
    NamespaceIds, ProcessRecord, RootNamespaces, SnapshotData, SnapshotProcess,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Root namespace inodes as found on a typical host.
const HOST_PID_NS: u64 = 4026531836;
const HOST_NET_NS: u64 = 4026531840;

/// Names used for synthetic processes.
const HOST_COMMS: &[&str] = &[
    "systemd", "sshd", "cron", "rsyslogd", "dockerd", "containerd", "bash", "journald",
];
const CONTAINER_COMMS: &[&str] = &[
    "nginx", "postgres", "redis-server", "node", "python3", "java", "sh", "tini",
];

/// Builds synthetic snapshot data.
pub fn generate_snapshot(
    rng: &mut impl Rng,
    containers: usize,
    per_container: usize,
    host_processes: usize,
) -> SnapshotData {
    let root = RootNamespaces {
        pid: HOST_PID_NS,
        net: HOST_NET_NS,
    };
    let host_ns = NamespaceIds {
        pid: Some(HOST_PID_NS),
        pid_for_children: Some(HOST_PID_NS),
        net: HOST_NET_NS,
    };

    let mut processes = Vec::new();
    let mut next_pid: u32 = 1;

    for i in 0..host_processes {
        let comm = HOST_COMMS[i % HOST_COMMS.len()];
        let ppid = if next_pid == 1 { 0 } else { 1 };
        let cgroup = format!("0::/system.slice/{}.service\n", comm);
        processes.push(SnapshotProcess {
            record: ProcessRecord::new(next_pid, ppid, comm, Some(host_ns)),
            cgroup: Some(cgroup),
        });
        next_pid += 1;
    }

    // Even inodes for PID namespaces, the following odd one for the network
    let ns_base = rng.gen_range(2013266000..2013270000_u64) * 2;
    for i in 0..containers {
        let pid_ns = ns_base + 2 * i as u64;
        let ns = NamespaceIds {
            pid: Some(pid_ns),
            pid_for_children: Some(pid_ns),
            net: pid_ns + 1,
        };
        let id: String = (0..64)
            .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
            .collect();
        let cgroup = format!("0::/docker/{}\n", id);
        let shim_pid = next_pid + rng.gen_range(1..200);
        let base_pid = shim_pid + 1;

        for j in 0..per_container {
            let comm = CONTAINER_COMMS.choose(rng).copied().unwrap_or("sh");
            let pid = base_pid + j as u32;
            let ppid = if j == 0 { shim_pid } else { base_pid };
            processes.push(SnapshotProcess {
                record: ProcessRecord::new(pid, ppid, comm, Some(ns)),
                cgroup: Some(cgroup.clone()),
            });
        }
        next_pid = base_pid + per_container as u32;
    }

    // /proc lists pids in order, but scans must not depend on that
    processes.shuffle(rng);

    SnapshotData {
        version: "1.0".to_string(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        root,
        processes,
    }
}

/// Generates a synthetic snapshot JSON file.
pub fn command_generate_snapshot(
    output: PathBuf,
    containers: usize,
    per_container: usize,
    host_processes: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!(
        "Generating snapshot: containers={}, per_container={}, host_processes={}, output={}",
        containers,
        per_container,
        host_processes,
        output.display()
    );

    let mut rng = rand::thread_rng();
    let data = generate_snapshot(&mut rng, containers, per_container, host_processes);

    let json_content = serde_json::to_string_pretty(&data)?;
    fs::write(&output, &json_content)?;

    println!(
        "✅ Generated snapshot: {} processes ({} containers) in {}",
        data.processes.len(),
        containers,
        output.display()
    );

    Ok(())
}

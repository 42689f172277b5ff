//! Integration tests for the census pipeline.
//!
//! These tests drive `Census::run` through an in-memory process table and
//! check the rendered output and the bounded dedup behavior.

use herakles_container_census::{
    render_table, BoundPolicy, Census, CensusSettings, NamespaceIds, ProcessRecord,
    RootNamespaces, SnapshotTable, Strategy, Truncation, EMPTY_ADVISORY, UNKNOWN_ID,
};

const ROOT: RootNamespaces = RootNamespaces {
    pid: 4026531836,
    net: 4026531840,
};

/// Helper for namespace ids of a process inside a container.
fn container_ns(pid_ns: u64) -> Option<NamespaceIds> {
    Some(NamespaceIds {
        pid: Some(pid_ns),
        pid_for_children: Some(pid_ns),
        net: pid_ns + 1,
    })
}

/// Helper for namespace ids of a host process.
fn host_ns() -> Option<NamespaceIds> {
    Some(NamespaceIds {
        pid: Some(ROOT.pid),
        pid_for_children: Some(ROOT.pid),
        net: ROOT.net,
    })
}

fn census(strategy: Strategy, bound_policy: BoundPolicy) -> Census {
    Census::new(CensusSettings {
        strategy,
        bound_policy,
        ..CensusSettings::default()
    })
}

#[test]
fn test_host_only_table_renders_empty_listing() {
    let table = SnapshotTable::new(ROOT);
    table.insert(ProcessRecord::new(1, 0, "systemd", host_ns()), Some("0::/init.scope\n"));
    table.insert(ProcessRecord::new(812, 1, "sshd", host_ns()), None);
    table.insert(ProcessRecord::new(900, 1, "kthreadd", None), None);

    let scan = Census::default().run(&table).unwrap();
    assert!(scan.is_empty());

    let lines = render_table(&scan);
    assert_eq!(
        lines,
        vec![
            "C_ID         PID      COMM                 PPID".to_string(),
            "-".repeat(58),
            "Total found: 0".to_string(),
            EMPTY_ADVISORY.to_string(),
        ]
    );
}

#[test]
fn test_lowest_pid_represents_namespace() {
    let table = SnapshotTable::new(ROOT);
    table.insert(ProcessRecord::new(500, 480, "worker", container_ns(0xABCD1234)), None);
    table.insert(ProcessRecord::new(200, 180, "nginx", container_ns(0xABCD1234)), None);

    let scan = Census::default().run(&table).unwrap();

    assert_eq!(scan.total(), 1);
    let rec = &scan.containers[0];
    assert_eq!(rec.pid, 200);
    assert_eq!(rec.ppid, 180);
    assert_eq!(rec.comm, "nginx");
    assert_eq!(rec.container_id, "abcd123400c8");
    assert_eq!(
        render_table(&scan)[1],
        "abcd123400c8 200      nginx                180"
    );
}

#[test]
fn test_cgroup_strategy_extracts_short_docker_id() {
    let table = SnapshotTable::new(ROOT);
    table.insert(
        ProcessRecord::new(4242, 4200, "redis-server", container_ns(4026532500)),
        Some("0::/system.slice/docker/abcdef0123456789abcdef/init\n"),
    );
    table.insert(
        ProcessRecord::new(1, 0, "systemd", host_ns()),
        Some("0::/docker/ffffffffffffffff\n"),
    );

    let scan = census(Strategy::Cgroup, BoundPolicy::Saturate)
        .run(&table)
        .unwrap();

    // init is in the root PID namespace and never reaches the cgroup check
    assert_eq!(scan.total(), 1);
    assert_eq!(scan.containers[0].pid, 4242);
    assert_eq!(scan.containers[0].container_id, "abcdef012345");
    assert_eq!(render_table(&scan)[0], "CONTAINER_ID PID      COMM                 PPID");
}

#[test]
fn test_cgroup_scope_without_docker_path_is_unknown() {
    let table = SnapshotTable::new(ROOT);
    table.insert(
        ProcessRecord::new(77, 70, "postgres", None),
        Some("0::/system.slice/docker-0123456789ab.scope\n"),
    );

    let scan = census(Strategy::Cgroup, BoundPolicy::Saturate)
        .run(&table)
        .unwrap();

    assert_eq!(scan.total(), 1);
    assert_eq!(scan.containers[0].container_id, UNKNOWN_ID);
}

#[test]
fn test_bound_drops_the_51st_container() {
    let table = SnapshotTable::new(ROOT);
    for i in 0..51u64 {
        let pid = 1000 + 10 * i as u32;
        table.insert(
            ProcessRecord::new(pid, 1, "app", container_ns(4026533000 + 2 * i)),
            None,
        );
    }
    // Lower pid for the rejected key must not displace anyone
    table.insert(
        ProcessRecord::new(5, 1, "app", container_ns(4026533000 + 2 * 50)),
        None,
    );

    let scan = Census::default().run(&table).unwrap();

    assert_eq!(scan.total(), 50);
    assert_eq!(scan.stats.dropped_by_bound, 2);
    assert_eq!(scan.stats.truncated, None);
    assert!(scan.containers.iter().all(|r| r.pid >= 1000));
    assert_eq!(scan.containers[49].pid, 1000 + 10 * 49);
}

#[test]
fn test_saturated_set_still_improves_representatives() {
    let table = SnapshotTable::new(ROOT);
    table.insert(ProcessRecord::new(300, 1, "a", container_ns(4026534000)), None);
    table.insert(ProcessRecord::new(400, 1, "b", container_ns(4026534002)), None);
    table.insert(ProcessRecord::new(500, 1, "c", container_ns(4026534004)), None);
    table.insert(ProcessRecord::new(150, 1, "a-init", container_ns(4026534000)), None);

    let settings = CensusSettings {
        max_containers: 2,
        ..CensusSettings::default()
    };
    let scan = Census::new(settings).run(&table).unwrap();

    assert_eq!(scan.total(), 2);
    assert_eq!(scan.containers[0].pid, 150);
    assert_eq!(scan.containers[0].comm, "a-init");
    assert_eq!(scan.containers[1].pid, 400);
}

#[test]
fn test_stop_policy_ends_walk_at_bound() {
    let table = SnapshotTable::new(ROOT);
    table.insert(ProcessRecord::new(300, 1, "a", container_ns(4026534000)), None);
    table.insert(ProcessRecord::new(400, 1, "b", container_ns(4026534002)), None);
    table.insert(ProcessRecord::new(150, 1, "a-init", container_ns(4026534000)), None);

    let settings = CensusSettings {
        max_containers: 2,
        bound_policy: BoundPolicy::Stop,
        ..CensusSettings::default()
    };
    let scan = Census::new(settings).run(&table).unwrap();

    assert_eq!(scan.total(), 2);
    assert_eq!(scan.stats.truncated, Some(Truncation::BoundReached));
    assert_eq!(scan.stats.processes_examined, 2);
    assert_eq!(scan.containers[0].pid, 300);
}

#[test]
fn test_scan_result_independent_of_table_order() {
    let forward = SnapshotTable::new(ROOT);
    let backward = SnapshotTable::new(ROOT);
    let procs: Vec<ProcessRecord> = (0..12u32)
        .map(|i| {
            ProcessRecord::new(
                100 + i,
                1,
                "svc",
                container_ns(4026535000 + 2 * u64::from(i % 3)),
            )
        })
        .collect();

    for p in &procs {
        forward.insert(p.clone(), None);
    }
    for p in procs.iter().rev() {
        backward.insert(p.clone(), None);
    }

    let mut a: Vec<u32> = Census::default()
        .run(&forward)
        .unwrap()
        .containers
        .iter()
        .map(|r| r.pid)
        .collect();
    let mut b: Vec<u32> = Census::default()
        .run(&backward)
        .unwrap()
        .containers
        .iter()
        .map(|r| r.pid)
        .collect();
    a.sort_unstable();
    b.sort_unstable();

    assert_eq!(a, vec![100, 101, 102]);
    assert_eq!(a, b);
}

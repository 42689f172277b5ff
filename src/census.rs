//! Container process census.
//!
//! One [`Census::run`] walks the process table once, classifies every process
//! with the configured strategy and keeps one representative record (lowest
//! pid) per container key. The result is a [`Scan`] owned by the caller; no
//! state survives between scans.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::CensusError;
use crate::process::{
    CgroupClassifier, ContainerClassifier, ContainerKey, NamespaceClassifier, ProcessRecord,
    ProcessTable, Sighting, Strategy, DEFAULT_CGROUP_MARKERS, DEFAULT_CGROUP_READ_LIMIT,
};

/// Maximum number of distinct containers kept per scan.
pub const DEFAULT_MAX_CONTAINERS: usize = 50;

/// What happens once `max_containers` records exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BoundPolicy {
    /// Stop admitting new keys, keep updating existing records, finish the walk.
    Saturate,
    /// End the walk as soon as the bound is reached.
    Stop,
}

/// Why a walk ended before visiting every process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Truncation {
    BoundReached,
    MaxProcesses,
    Timeout,
}

/// Census tuning knobs.
#[derive(Debug, Clone)]
pub struct CensusSettings {
    pub strategy: Strategy,
    pub max_containers: usize,
    pub bound_policy: BoundPolicy,
    pub cgroup_read_limit: usize,
    pub cgroup_markers: Vec<String>,
    /// Upper bound on processes classified per scan.
    pub max_processes: Option<usize>,
    /// Wall-clock budget per scan.
    pub scan_timeout: Option<Duration>,
    pub include_names: Option<Vec<String>>,
    pub exclude_names: Option<Vec<String>>,
}

impl Default for CensusSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::Namespace,
            max_containers: DEFAULT_MAX_CONTAINERS,
            bound_policy: BoundPolicy::Saturate,
            cgroup_read_limit: DEFAULT_CGROUP_READ_LIMIT,
            cgroup_markers: DEFAULT_CGROUP_MARKERS.iter().map(|s| s.to_string()).collect(),
            max_processes: None,
            scan_timeout: None,
            include_names: None,
            exclude_names: None,
        }
    }
}

/// One distinct container observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub key: ContainerKey,
    /// Smallest pid seen for `key`.
    pub pid: u32,
    pub comm: String,
    pub ppid: u32,
    pub container_id: String,
}

impl ContainerRecord {
    fn from_sighting(process: &ProcessRecord, sighting: Sighting) -> Self {
        Self {
            key: sighting.key,
            pid: process.pid,
            comm: process.comm.clone(),
            ppid: process.ppid,
            container_id: sighting.container_id,
        }
    }

    /// Replaces the representative; the key stays.
    fn replace_representative(&mut self, process: &ProcessRecord, container_id: String) {
        self.pid = process.pid;
        self.comm = process.comm.clone();
        self.ppid = process.ppid;
        self.container_id = container_id;
    }
}

/// Outcome of offering one containerized process to a [`ContainerSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Inserted,
    Replaced,
    Kept,
    Rejected,
}

/// Bounded, insertion-ordered collection of container records.
///
/// Lookups are linear; the bound keeps them cheap.
#[derive(Debug, Clone)]
pub struct ContainerSet {
    records: Vec<ContainerRecord>,
    capacity: usize,
}

impl ContainerSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn records(&self) -> &[ContainerRecord] {
        &self.records
    }

    pub fn observe(&mut self, process: &ProcessRecord, sighting: Sighting) -> Observation {
        if let Some(existing) = self.records.iter_mut().find(|r| r.key == sighting.key) {
            if process.pid < existing.pid {
                existing.replace_representative(process, sighting.container_id);
                return Observation::Replaced;
            }
            return Observation::Kept;
        }

        if self.is_full() {
            return Observation::Rejected;
        }

        self.records
            .push(ContainerRecord::from_sighting(process, sighting));
        Observation::Inserted
    }

    pub fn into_records(self) -> Vec<ContainerRecord> {
        self.records
    }
}

/// Counters collected during one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Processes in the snapshot.
    pub processes_total: usize,
    /// Processes handed to the classifier.
    pub processes_examined: usize,
    /// Processes classified as containerized.
    pub containerized: usize,
    /// Containerized processes whose key was refused by the bound.
    pub dropped_by_bound: usize,
    pub truncated: Option<Truncation>,
}

/// Result of one census pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub strategy: Strategy,
    pub started_at: DateTime<Utc>,
    pub duration_ms: f64,
    pub max_containers: usize,
    pub stats: ScanStats,
    /// Records in discovery order.
    pub containers: Vec<ContainerRecord>,
}

impl Scan {
    pub fn total(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

/// Determines if a process should be considered based on name filters.
///
/// Exclude patterns take priority over include patterns.
pub fn should_include_process(
    name: &str,
    include: Option<&[String]>,
    exclude: Option<&[String]>,
) -> bool {
    if let Some(ex) = exclude {
        if ex.iter().any(|s| name.contains(s.as_str())) {
            return false;
        }
    }
    if let Some(inc) = include {
        if !inc.is_empty() {
            return inc.iter().any(|s| name.contains(s.as_str()));
        }
    }
    true
}

/// Runs container scans with fixed settings.
#[derive(Debug, Clone, Default)]
pub struct Census {
    settings: CensusSettings,
}

impl Census {
    pub fn new(settings: CensusSettings) -> Self {
        Self { settings }
    }

    fn classifier<'a>(
        &self,
        table: &'a dyn ProcessTable,
    ) -> Result<Box<dyn ContainerClassifier + 'a>, CensusError> {
        match self.settings.strategy {
            Strategy::Namespace => {
                let root = table.root_namespaces()?;
                Ok(Box::new(NamespaceClassifier::new(root)))
            }
            Strategy::Cgroup => {
                // Root namespaces only feed the fast negative here
                let root_pid_ns = match table.root_namespaces() {
                    Ok(root) => Some(root.pid),
                    Err(e) => {
                        warn!("Root PID namespace unknown, reading every cgroup file: {}", e);
                        None
                    }
                };
                Ok(Box::new(CgroupClassifier::new(
                    table,
                    root_pid_ns,
                    self.settings.cgroup_markers.clone(),
                    self.settings.cgroup_read_limit,
                )))
            }
        }
    }

    /// Performs one full scan of `table`.
    pub fn run(&self, table: &dyn ProcessTable) -> Result<Scan, CensusError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let settings = &self.settings;

        let classifier = self.classifier(table)?;
        // Any provider lock is released once the snapshot is taken; cgroup
        // reads below may block.
        let processes = table.snapshot()?;

        let mut set = ContainerSet::with_capacity(settings.max_containers);
        let mut stats = ScanStats {
            processes_total: processes.len(),
            ..ScanStats::default()
        };

        for process in &processes {
            if let Some(max) = settings.max_processes {
                if stats.processes_examined >= max {
                    warn!("Process cap of {} reached, ending scan early", max);
                    stats.truncated = Some(Truncation::MaxProcesses);
                    break;
                }
            }
            if let Some(budget) = settings.scan_timeout {
                if start.elapsed() >= budget {
                    warn!("Scan time budget of {:?} exhausted, ending scan early", budget);
                    stats.truncated = Some(Truncation::Timeout);
                    break;
                }
            }
            if !should_include_process(
                &process.comm,
                settings.include_names.as_deref(),
                settings.exclude_names.as_deref(),
            ) {
                continue;
            }

            stats.processes_examined += 1;
            let sighting = match classifier.identify(process) {
                Some(s) => s,
                None => continue,
            };
            stats.containerized += 1;

            match set.observe(process, sighting) {
                Observation::Inserted => {
                    if let Some(rec) = set.records().last() {
                        debug!(
                            "New container {} via pid {} ({})",
                            rec.key, process.pid, process.comm
                        );
                    }
                }
                Observation::Replaced => {
                    debug!("pid {} is the new representative", process.pid);
                }
                Observation::Kept => {}
                Observation::Rejected => {
                    stats.dropped_by_bound += 1;
                    debug!(
                        "Container bound of {} reached, dropping pid {}",
                        settings.max_containers, process.pid
                    );
                }
            }

            if settings.bound_policy == BoundPolicy::Stop && set.is_full() {
                warn!(
                    "Container bound of {} reached, ending scan early",
                    settings.max_containers
                );
                stats.truncated = Some(Truncation::BoundReached);
                break;
            }
        }

        if stats.dropped_by_bound > 0 {
            warn!(
                "{} containerized processes dropped by the container bound of {}",
                stats.dropped_by_bound, settings.max_containers
            );
        }

        let duration = start.elapsed();
        info!(
            "Scan ({}) finished in {:.2}ms: {} processes, {} examined, {} containerized, {} containers",
            classifier.strategy(),
            duration.as_secs_f64() * 1000.0,
            stats.processes_total,
            stats.processes_examined,
            stats.containerized,
            set.len()
        );

        Ok(Scan {
            strategy: classifier.strategy(),
            started_at,
            duration_ms: duration.as_secs_f64() * 1000.0,
            max_containers: settings.max_containers,
            stats,
            containers: set.into_records(),
        })
    }
}

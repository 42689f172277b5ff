//! Runtime requirement validation for herakles-container-census.
//!
//! Validates that the census can see every process and resolve the
//! namespaces and cgroups it classifies with.

use nix::unistd::geteuid;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges()?;
    check_proc_mounted(proc_root)?;
    check_namespace_access(proc_root)?;
    check_cgroup_access(proc_root)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() -> Result<(), ValidationError> {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - namespaces of other users' processes are unreadable");
        warn!("   Those processes will be classified as not containerized");
        // Not an error - continue but warn
    } else {
        info!("✅ Running as root (uid=0)");
    }
    Ok(())
}

fn check_proc_mounted(proc_root: &Path) -> Result<(), ValidationError> {
    if !proc_root.is_dir() {
        error!("❌ {} not found - proc filesystem not mounted", proc_root.display());
        error!("   Solution: mount -t proc proc {}", proc_root.display());
        return Err(ValidationError::ProcNotMounted(
            proc_root.display().to_string(),
        ));
    }
    info!("✅ {} is mounted", proc_root.display());
    Ok(())
}

/// Check namespace link access for init, which the namespace strategy compares against
fn check_namespace_access(proc_root: &Path) -> Result<(), ValidationError> {
    let link = proc_root.join("1/ns/pid");

    match fs::read_link(&link) {
        Ok(target) => {
            info!("✅ Root PID namespace: {}", target.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            error!("❌ Cannot read {} - insufficient permissions", link.display());
            error!("   The namespace strategy cannot resolve the host namespaces!");
            error!("");
            error!("   Solutions:");
            error!("   1. Run as root");
            error!("   2. Grant capabilities:");
            error!("      setcap cap_sys_ptrace,cap_dac_read_search+ep /path/to/binary");
            Err(ValidationError::InsufficientPermissions(e.to_string()))
        }
        Err(e) => {
            warn!("⚠️  Could not test namespace access: {}", e);
            Ok(()) // Continue but warn
        }
    }
}

/// Check cgroup membership access for init
fn check_cgroup_access(proc_root: &Path) -> Result<(), ValidationError> {
    let file = proc_root.join("1/cgroup");
    match fs::metadata(&file) {
        Ok(_) => {
            info!("✅ cgroup membership readable");
        }
        Err(e) => {
            warn!("⚠️  Could not access {}: {}", file.display(), e);
            warn!("   The cgroup strategy will treat unreadable processes as not containerized");
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("proc filesystem not mounted at {0}")]
    ProcNotMounted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_proc_root_fails() {
        let result = validate_requirements(Path::new("/nonexistent/proc"));
        assert!(matches!(result, Err(ValidationError::ProcNotMounted(_))));
    }

    #[test]
    fn test_empty_proc_root_only_warns() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert!(validate_requirements(dir.path()).is_ok());
    }
}

//! Container identifier and dedup key derivation.
//!
//! Namespace ids are synthesized from the child PID namespace inode and the
//! pid; cgroup ids are cut out of the membership text after `/docker/`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CensusError;
use crate::process::record::ProcessRecord;

/// Placeholder shown when no identifier could be derived.
pub const UNKNOWN_ID: &str = "unknown";

/// Marker that precedes a full container id in cgroup paths.
pub const DOCKER_PATH_MARKER: &str = "/docker/";

/// Upper bound on the raw id segment, matching the fixed id buffer size.
pub const MAX_CONTAINER_ID_LEN: usize = 64;

/// Length of the short-form container id (`docker ps` style).
pub const SHORT_ID_LEN: usize = 12;

/// Dedup key of a container within one scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContainerKey {
    /// Inode of the child PID namespace.
    Namespace(u64),
    /// Cgroup path of the membership line that matched a runtime marker.
    Cgroup(String),
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKey::Namespace(inum) => write!(f, "pidns:{}", inum),
            ContainerKey::Cgroup(path) => write!(f, "cgroup:{}", path),
        }
    }
}

/// Formats a namespace-derived id: 8 hex digits of the inode, then 4 hex
/// digits of the low 16 bits of the pid.
pub fn format_namespace_id(ns_inum: u64, pid: u32) -> String {
    // The kernel's ns.inum is an unsigned int
    format!("{:08x}{:04x}", ns_inum as u32, pid & 0xFFFF)
}

/// Derives the namespace id of a process.
pub fn namespace_container_id(process: &ProcessRecord) -> Result<String, CensusError> {
    let inum = process
        .pid_ns_for_children()
        .ok_or(CensusError::MissingNamespaceData { pid: process.pid })?;
    Ok(format_namespace_id(inum, process.pid))
}

/// Extracts the short container id following `/docker/` in membership text.
pub fn cgroup_container_id(text: &[u8]) -> Result<String, CensusError> {
    let start = find(text, DOCKER_PATH_MARKER.as_bytes())
        .map(|pos| pos + DOCKER_PATH_MARKER.len())
        .ok_or(CensusError::IdentifierExtraction {
            reason: "no /docker/ marker",
        })?;
    let rest = &text[start..];
    let end = rest
        .iter()
        .position(|&b| b == b'/' || b == b'\n')
        .ok_or(CensusError::IdentifierExtraction {
            reason: "id segment is not terminated",
        })?;
    if end == 0 {
        return Err(CensusError::IdentifierExtraction {
            reason: "empty id segment",
        });
    }

    let segment = &rest[..end.min(MAX_CONTAINER_ID_LEN)];
    let full = String::from_utf8_lossy(segment);
    Ok(full.chars().take(SHORT_ID_LEN).collect())
}

/// Like [`cgroup_container_id`], substituting [`UNKNOWN_ID`] on failure.
pub fn cgroup_container_id_or_unknown(text: &[u8]) -> String {
    cgroup_container_id(text).unwrap_or_else(|_| UNKNOWN_ID.to_string())
}

/// Derives the cgroup dedup key from membership text.
///
/// Uses the path field of the first line carrying one of `markers`; when no
/// single line does, the whole trimmed text is the key.
pub fn cgroup_key(text: &[u8], markers: &[String]) -> ContainerKey {
    let text = String::from_utf8_lossy(text);
    for line in text.lines() {
        if markers.iter().any(|m| line.contains(m.as_str())) {
            // hierarchy-ID:controller-list:cgroup-path
            let path = line.splitn(3, ':').nth(2).unwrap_or(line);
            return ContainerKey::Cgroup(path.to_string());
        }
    }
    ContainerKey::Cgroup(text.trim().to_string())
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::record::NamespaceIds;

    fn markers() -> Vec<String> {
        ["/docker/", "docker-", ".scope", "container"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_format_namespace_id() {
        assert_eq!(format_namespace_id(0xABCD1234, 200), "abcd123400c8");
        assert_eq!(format_namespace_id(0xABCD1234, 200).len(), 12);
    }

    #[test]
    fn test_format_namespace_id_uses_low_pid_bits() {
        // 0x12345 -> low 16 bits 0x2345
        assert_eq!(format_namespace_id(1, 0x12345), "000000012345");
    }

    #[test]
    fn test_format_namespace_id_deterministic() {
        let a = format_namespace_id(4026532198, 31337);
        let b = format_namespace_id(4026532198, 31337);
        assert_eq!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_namespace_container_id_missing_data() {
        let no_proxy = ProcessRecord::new(10, 1, "sh", None);
        assert!(matches!(
            namespace_container_id(&no_proxy),
            Err(CensusError::MissingNamespaceData { pid: 10 })
        ));

        let no_child_ns = ProcessRecord::new(
            11,
            1,
            "sh",
            Some(NamespaceIds {
                pid: Some(5),
                pid_for_children: None,
                net: 6,
            }),
        );
        assert!(namespace_container_id(&no_child_ns).is_err());
    }

    #[test]
    fn test_cgroup_container_id_short_form() {
        let text = b"12:cpu,cpuacct:/docker/abcdef0123456789abcdef/init\n";
        assert_eq!(cgroup_container_id(text).unwrap(), "abcdef012345");
    }

    #[test]
    fn test_cgroup_container_id_newline_terminator() {
        let text = b"0::/docker/0123456789abcdef0123\n";
        assert_eq!(cgroup_container_id(text).unwrap(), "0123456789ab");
    }

    #[test]
    fn test_cgroup_container_id_first_marker_wins() {
        let text = b"1:name=systemd:/docker/aaaaaaaaaaaaaaaa\n0::/docker/bbbbbbbbbbbbbbbb\n";
        assert_eq!(cgroup_container_id(text).unwrap(), "aaaaaaaaaaaa");
    }

    #[test]
    fn test_cgroup_container_id_text_continues_after_id() {
        let text = b"1:cpu:/docker/abcdef0123456789abcdef,x\n";
        assert_eq!(cgroup_container_id(text).unwrap(), "abcdef012345");

        let text = b"0::/x,/docker/abcdef0123456789abcdef,/y\n";
        assert_eq!(cgroup_container_id(text).unwrap(), "abcdef012345");
    }

    #[test]
    fn test_cgroup_container_id_short_segment_kept_whole() {
        let text = b"0::/docker/abc/\n";
        assert_eq!(cgroup_container_id(text).unwrap(), "abc");
    }

    #[test]
    fn test_cgroup_container_id_failures() {
        assert!(cgroup_container_id(b"0::/user.slice/session-1.scope\n").is_err());
        assert!(cgroup_container_id(b"0::/docker/abcdef").is_err());
        assert!(cgroup_container_id(b"0::/docker//x\n").is_err());
        assert!(cgroup_container_id(b"").is_err());
    }

    #[test]
    fn test_cgroup_container_id_or_unknown() {
        assert_eq!(cgroup_container_id_or_unknown(b"0::/\n"), UNKNOWN_ID);
    }

    #[test]
    fn test_cgroup_container_id_idempotent() {
        let inputs: [&[u8]; 3] = [
            b"0::/docker/abcdef0123456789abcdef\n",
            b"0::/system.slice/docker-abc.scope\n",
            b"0::/docker/unterminated",
        ];
        for text in inputs {
            let first = cgroup_container_id(text).ok();
            let second = cgroup_container_id(text).ok();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_cgroup_key_uses_matching_line_path() {
        let text = b"2:memory:/\n1:cpu:/docker/abcdef/\n0::/\n";
        assert_eq!(
            cgroup_key(text, &markers()),
            ContainerKey::Cgroup("/docker/abcdef/".into())
        );
    }

    #[test]
    fn test_cgroup_key_systemd_scope() {
        let text = b"0::/system.slice/docker-0123abcd.scope\n";
        assert_eq!(
            cgroup_key(text, &markers()),
            ContainerKey::Cgroup("/system.slice/docker-0123abcd.scope".into())
        );
    }

    #[test]
    fn test_container_key_display() {
        assert_eq!(ContainerKey::Namespace(7).to_string(), "pidns:7");
        assert_eq!(
            ContainerKey::Cgroup("/docker/x".into()).to_string(),
            "cgroup:/docker/x"
        );
    }
}

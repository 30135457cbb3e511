//! Snapshot diffing
//!
//! Keyed by host identifier. A host whose address changed shows up in both
//! lists, so it is removed and re-added; unchanged hosts show up in neither.

use std::net::Ipv4Addr;

use crate::types::HostSnapshot;

/// Changes to apply to the record store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDelta {
    /// Hosts to remove, sorted
    pub removed: Vec<String>,

    /// Hosts to add, sorted by host identifier
    pub added: Vec<(String, Ipv4Addr)>,
}

impl SnapshotDelta {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Compute what changed between two snapshots
pub fn diff(previous: &HostSnapshot, current: &HostSnapshot) -> SnapshotDelta {
    let mut removed: Vec<String> = previous
        .iter()
        .filter(|(host, ip)| current.get(*host) != Some(*ip))
        .map(|(host, _)| host.clone())
        .collect();

    let mut added: Vec<(String, Ipv4Addr)> = current
        .iter()
        .filter(|(host, ip)| previous.get(*host) != Some(*ip))
        .map(|(host, ip)| (host.clone(), *ip))
        .collect();

    removed.sort();
    added.sort();

    SnapshotDelta { removed, added }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, [u8; 4])]) -> HostSnapshot {
        entries
            .iter()
            .map(|(host, ip)| (host.to_string(), Ipv4Addr::from(*ip)))
            .collect()
    }

    #[test]
    fn test_no_changes() {
        let a = snapshot(&[("web", [10, 0, 0, 5]), ("db", [10, 0, 0, 6])]);
        assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_added_and_removed() {
        let before = snapshot(&[("web", [10, 0, 0, 5]), ("old", [10, 0, 0, 7])]);
        let after = snapshot(&[("web", [10, 0, 0, 5]), ("db", [10, 0, 0, 6])]);

        let delta = diff(&before, &after);
        assert_eq!(delta.removed, vec!["old".to_string()]);
        assert_eq!(delta.added, vec![("db".to_string(), Ipv4Addr::new(10, 0, 0, 6))]);
    }

    #[test]
    fn test_changed_address_is_remove_then_add() {
        let before = snapshot(&[("web", [10, 0, 0, 5])]);
        let after = snapshot(&[("web", [10, 0, 0, 9])]);

        let delta = diff(&before, &after);
        assert_eq!(delta.removed, vec!["web".to_string()]);
        assert_eq!(delta.added, vec![("web".to_string(), Ipv4Addr::new(10, 0, 0, 9))]);
    }

    #[test]
    fn test_from_empty() {
        let after = snapshot(&[("b", [10, 0, 0, 2]), ("a", [10, 0, 0, 1])]);
        let delta = diff(&HostSnapshot::new(), &after);
        assert!(delta.removed.is_empty());
        assert_eq!(delta.added[0].0, "a");
        assert_eq!(delta.added[1].0, "b");
    }
}

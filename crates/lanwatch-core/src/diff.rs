//! Reconciliation: compute which hosts joined or left between two scans.

use std::net::Ipv4Addr;

use crate::types::DeviceSet;

/// The outcome of reconciling two device sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    /// IPs present in `current` but not `previous`, sorted by address.
    pub joined: Vec<String>,
    /// IPs present in `previous` but not `current`, sorted by address.
    pub left: Vec<String>,
}

impl DiffOutcome {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty()
    }
}

/// Compare two device sets by IP membership.
///
/// Pure function. Identity is the IP alone: a host whose MAC changed while
/// its IP persisted produces no event. Output ordering is numeric by IPv4
/// value so event emission is deterministic.
pub fn diff(previous: &DeviceSet, current: &DeviceSet) -> DiffOutcome {
    let joined = sort_by_ip(
        current
            .keys()
            .filter(|ip| !previous.contains_key(*ip))
            .cloned()
            .collect(),
    );
    let left = sort_by_ip(
        previous
            .keys()
            .filter(|ip| !current.contains_key(*ip))
            .cloned()
            .collect(),
    );

    DiffOutcome { joined, left }
}

/// Sort IP strings numerically; unparseable entries sort last, lexically.
pub fn sort_by_ip(mut ips: Vec<String>) -> Vec<String> {
    ips.sort_by(|a, b| {
        let pa = a.parse::<Ipv4Addr>().ok();
        let pb = b.parse::<Ipv4Addr>().ok();
        match (pa, pb) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    ips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Device;
    use chrono::Utc;

    fn set(ips: &[&str]) -> DeviceSet {
        ips.iter()
            .map(|ip| {
                (
                    ip.to_string(),
                    Device::new("AA:BB:CC:DD:EE:FF", Utc::now()),
                )
            })
            .collect()
    }

    #[test]
    fn detects_joined_host() {
        let previous = set(&["192.168.1.5"]);
        let current = set(&["192.168.1.5", "192.168.1.9"]);

        let outcome = diff(&previous, &current);
        assert_eq!(outcome.joined, vec!["192.168.1.9"]);
        assert!(outcome.left.is_empty());
    }

    #[test]
    fn detects_left_host() {
        let previous = set(&["192.168.1.5", "192.168.1.9"]);
        let current = set(&["192.168.1.5"]);

        let outcome = diff(&previous, &current);
        assert!(outcome.joined.is_empty());
        assert_eq!(outcome.left, vec!["192.168.1.9"]);
    }

    #[test]
    fn no_change_yields_empty_outcome() {
        let a = set(&["10.0.0.1", "10.0.0.2"]);
        let outcome = diff(&a, &a);
        assert!(outcome.is_empty());
    }

    #[test]
    fn diff_is_symmetric_under_swap() {
        let a = set(&["10.0.0.1", "10.0.0.3", "10.0.0.7"]);
        let b = set(&["10.0.0.3", "10.0.0.9"]);

        let forward = diff(&a, &b);
        let backward = diff(&b, &a);
        assert_eq!(forward.joined, backward.left);
        assert_eq!(forward.left, backward.joined);
    }

    #[test]
    fn mac_change_is_not_an_event() {
        let mut previous = DeviceSet::new();
        previous.insert(
            "192.168.1.5".to_string(),
            Device::new("AA:AA:AA:AA:AA:AA", Utc::now()),
        );
        let mut current = DeviceSet::new();
        current.insert(
            "192.168.1.5".to_string(),
            Device::new("BB:BB:BB:BB:BB:BB", Utc::now()),
        );

        assert!(diff(&previous, &current).is_empty());
    }

    #[test]
    fn output_sorted_numerically_not_lexically() {
        let previous = DeviceSet::new();
        let current = set(&["192.168.1.100", "192.168.1.9", "192.168.1.20"]);

        let outcome = diff(&previous, &current);
        assert_eq!(
            outcome.joined,
            vec!["192.168.1.9", "192.168.1.20", "192.168.1.100"]
        );
    }
}

// src/resolve/visited.rs
// =============================================================================
// The set of packages already scheduled in this run.
//
// Two sibling tasks can discover the same dependency at the same moment
// (libc6, libgcc-s1 and friends are everywhere). `try_claim` checks and
// inserts under one lock, so exactly one of them wins and the other stops.
// =============================================================================

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct VisitedSet {
    claimed: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `package` was not claimed before (and claims it now)
    pub fn try_claim(&self, package: &str) -> bool {
        let mut claimed = self
            .claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if claimed.contains(package) {
            return false;
        }
        claimed.insert(package.to_string())
    }

    pub fn len(&self) -> usize {
        self.claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_claim_once() {
        let visited = VisitedSet::new();
        assert!(visited.try_claim("libdbus-1-3"));
        assert!(!visited.try_claim("libdbus-1-3"));
        assert!(visited.try_claim("libcap2"));
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_concurrent_claims_succeed_exactly_once() {
        let visited = Arc::new(VisitedSet::new());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || visited.try_claim("libc6"))
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(visited.len(), 1);
    }
}

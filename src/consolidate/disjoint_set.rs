use std::collections::HashMap;

/// Disjoint-set over raw speaker identities. Merges are order-independent:
/// the partition after a sequence of unions does not depend on the order
/// they were applied in.
#[derive(Debug, Default)]
pub struct DisjointSet {
    parent: HashMap<String, String>,
}

impl DisjointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity as its own singleton group.
    pub fn insert(&mut self, id: &str) {
        self.parent
            .entry(id.to_string())
            .or_insert_with(|| id.to_string());
    }

    /// Root representative of an identity, with path compression.
    pub fn find(&mut self, id: &str) -> String {
        let parent = match self.parent.get(id) {
            Some(p) => p.clone(),
            None => {
                self.insert(id);
                return id.to_string();
            }
        };
        if parent == id {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(id.to_string(), root.clone());
        root
    }

    /// Merge the groups containing `a` and `b`. The lexicographically
    /// smaller root becomes the representative so the partition is
    /// deterministic regardless of union order.
    pub fn union(&mut self, a: &str, b: &str) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (keep, absorb) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent.insert(absorb, keep);
    }

    /// Groups as root -> members, members sorted for determinism.
    pub fn groups(&mut self) -> HashMap<String, Vec<String>> {
        let ids: Vec<String> = self.parent.keys().cloned().collect();
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for id in ids {
            let root = self.find(&id);
            groups.entry(root).or_default().push(id);
        }
        for members in groups.values_mut() {
            members.sort();
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitive_merge() {
        let mut ds = DisjointSet::new();
        for id in ["1", "2", "3", "4"] {
            ds.insert(id);
        }
        ds.union("1", "2");
        ds.union("2", "3");

        assert_eq!(ds.find("1"), ds.find("3"));
        assert_ne!(ds.find("1"), ds.find("4"));
    }

    #[test]
    fn test_groups_partition() {
        let mut ds = DisjointSet::new();
        for id in ["a", "b", "c"] {
            ds.insert(id);
        }
        ds.union("a", "c");
        let groups = ds.groups();

        assert_eq!(groups.len(), 2);
        let total: usize = groups.values().map(|g| g.len()).sum();
        assert_eq!(total, 3);
        assert_eq!(groups["a"], vec!["a", "c"]);
    }

    #[test]
    fn test_order_independent() {
        let mut forward = DisjointSet::new();
        let mut backward = DisjointSet::new();
        for id in ["x", "y", "z"] {
            forward.insert(id);
            backward.insert(id);
        }
        forward.union("x", "y");
        forward.union("y", "z");
        backward.union("y", "z");
        backward.union("x", "y");

        assert_eq!(forward.groups(), backward.groups());
    }
}

//! Whole-graph view of the supplier forest.
//!
//! Built from a full listing of nodes, it recomputes every level from scratch
//! and reports each node that breaks a hierarchy invariant. The mutator uses
//! it for repair passes; operators use it to audit a store.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use uuid::Uuid;

use network_shared::NetworkNode;

/// A node that breaks one of the hierarchy invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// The node's supplier chain loops back on itself.
    Cycle { node_id: Uuid },
    /// A factory names a supplier.
    FactoryWithSupplier { node_id: Uuid, supplier_id: Uuid },
    /// The node names a supplier that does not exist.
    DanglingSupplier { node_id: Uuid, supplier_id: Uuid },
    /// The stored level differs from the distance to the root.
    LevelMismatch { node_id: Uuid, stored: u32, expected: u32 },
}

/// Parent and child indices over a snapshot of all nodes.
pub struct SupplierForest {
    nodes: HashMap<Uuid, NetworkNode>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl SupplierForest {
    /// Index a full listing of nodes.
    pub fn new(nodes: impl IntoIterator<Item = NetworkNode>) -> Self {
        let nodes: HashMap<Uuid, NetworkNode> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::with_capacity(nodes.len());
        for node in nodes.values() {
            if let Some(supplier_id) = node.supplier_id {
                children.entry(supplier_id).or_default().push(node.id);
            }
        }
        for ids in children.values_mut() {
            ids.sort();
        }

        Self { nodes, children }
    }

    /// Look up a node in the snapshot.
    pub fn get(&self, id: &Uuid) -> Option<&NetworkNode> {
        self.nodes.get(id)
    }

    /// Iterate over every node, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes.values()
    }

    /// Recompute the level of every node from the supplier links alone.
    ///
    /// Nodes whose chain loops or reaches a missing supplier get no entry.
    pub fn expected_levels(&self) -> HashMap<Uuid, u32> {
        let mut levels: HashMap<Uuid, u32> = HashMap::with_capacity(self.nodes.len());
        let mut broken: HashSet<Uuid> = HashSet::new();

        for start in self.nodes.keys() {
            if levels.contains_key(start) || broken.contains(start) {
                continue;
            }

            // Walk up until a root, a node already resolved, or trouble.
            let mut path: Vec<Uuid> = Vec::new();
            let mut on_path: HashSet<Uuid> = HashSet::new();
            let mut current = *start;
            let base: Option<u32> = loop {
                if let Some(&level) = levels.get(&current) {
                    break Some(level);
                }
                if broken.contains(&current) || !on_path.insert(current) {
                    break None;
                }
                path.push(current);
                match self.nodes.get(&current).and_then(|n| n.supplier_id) {
                    None => {
                        if self.nodes.contains_key(&current) {
                            // `current` is a root: it sits at level 0 and is
                            // resolved by the assignment below.
                            path.pop();
                            levels.insert(current, 0);
                            break Some(0);
                        }
                        break None;
                    }
                    Some(supplier_id) => {
                        if !self.nodes.contains_key(&supplier_id) {
                            break None;
                        }
                        current = supplier_id;
                    }
                }
            };

            match base {
                Some(mut level) => {
                    for id in path.into_iter().rev() {
                        level += 1;
                        levels.insert(id, level);
                    }
                }
                None => broken.extend(path),
            }
        }

        levels
    }

    /// All transitive clients of `root`, breadth first, excluding `root`.
    pub fn descendants(&self, root: &Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut seen: HashSet<Uuid> = HashSet::new();
        seen.insert(*root);
        let mut queue: VecDeque<Uuid> = self
            .children
            .get(root)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            if let Some(ids) = self.children.get(&id) {
                queue.extend(ids.iter().copied());
            }
        }

        out
    }

    /// Check every invariant against the snapshot.
    ///
    /// Violations are ordered by node id so reports are stable.
    pub fn audit(&self) -> Vec<InvariantViolation> {
        let levels = self.expected_levels();
        let mut violations = Vec::new();

        let mut ids: Vec<&Uuid> = self.nodes.keys().collect();
        ids.sort();

        for id in ids {
            let node = &self.nodes[id];
            if let Some(supplier_id) = node.supplier_id {
                if node.is_factory() {
                    violations.push(InvariantViolation::FactoryWithSupplier {
                        node_id: node.id,
                        supplier_id,
                    });
                }
                if !self.nodes.contains_key(&supplier_id) {
                    violations.push(InvariantViolation::DanglingSupplier {
                        node_id: node.id,
                        supplier_id,
                    });
                    continue;
                }
            }
            match levels.get(id) {
                Some(&expected) if expected != node.level => {
                    violations.push(InvariantViolation::LevelMismatch {
                        node_id: node.id,
                        stored: node.level,
                        expected,
                    });
                }
                Some(_) => {}
                None => {
                    if self.on_cycle(id) {
                        violations.push(InvariantViolation::Cycle { node_id: node.id });
                    }
                }
            }
        }

        violations
    }

    /// Whether following supplier links from `id` returns to `id`.
    fn on_cycle(&self, id: &Uuid) -> bool {
        let mut current = self.nodes.get(id).and_then(|n| n.supplier_id);
        for _ in 0..self.nodes.len() {
            match current {
                Some(next) if next == *id => return true,
                Some(next) => current = self.nodes.get(&next).and_then(|n| n.supplier_id),
                None => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use network_shared::{NewNode, NodeType};

    fn node(name: &str, node_type: NodeType, supplier: Option<&NetworkNode>, level: u32) -> NetworkNode {
        let mut new = NewNode::new(name, node_type);
        if let Some(s) = supplier {
            new = new.with_supplier(s.id);
        }
        new.into_node(level)
    }

    #[test]
    fn test_expected_levels_for_chain() {
        let f = node("F", NodeType::Factory, None, 0);
        let r = node("R", NodeType::Retail, Some(&f), 1);
        let e = node("E", NodeType::Entrepreneur, Some(&r), 2);
        let forest = SupplierForest::new(vec![e.clone(), r.clone(), f.clone()]);

        let levels = forest.expected_levels();

        assert_eq!(levels[&f.id], 0);
        assert_eq!(levels[&r.id], 1);
        assert_eq!(levels[&e.id], 2);
        assert!(forest.audit().is_empty());
    }

    #[test]
    fn test_descendants_excludes_other_branches() {
        let f = node("F", NodeType::Factory, None, 0);
        let r1 = node("R1", NodeType::Retail, Some(&f), 1);
        let r2 = node("R2", NodeType::Retail, Some(&f), 1);
        let e = node("E", NodeType::Entrepreneur, Some(&r1), 2);
        let forest = SupplierForest::new(vec![f.clone(), r1.clone(), r2.clone(), e.clone()]);

        let below_r1 = forest.descendants(&r1.id);
        assert_eq!(below_r1, vec![e.id]);

        let mut below_f = forest.descendants(&f.id);
        below_f.sort();
        let mut expected = vec![r1.id, r2.id, e.id];
        expected.sort();
        assert_eq!(below_f, expected);
    }

    #[test]
    fn test_audit_reports_level_mismatch() {
        let f = node("F", NodeType::Factory, None, 0);
        let r = node("R", NodeType::Retail, Some(&f), 5);
        let forest = SupplierForest::new(vec![f, r.clone()]);

        assert_eq!(
            forest.audit(),
            vec![InvariantViolation::LevelMismatch {
                node_id: r.id,
                stored: 5,
                expected: 1
            }]
        );
    }

    #[test]
    fn test_audit_reports_cycle_and_dangling() {
        let mut a = node("A", NodeType::Retail, None, 0);
        let mut b = node("B", NodeType::Retail, None, 0);
        a.supplier_id = Some(b.id);
        b.supplier_id = Some(a.id);
        let missing = uuid::Uuid::new_v4();
        let mut c = node("C", NodeType::Retail, None, 0);
        c.supplier_id = Some(missing);
        let forest = SupplierForest::new(vec![a.clone(), b.clone(), c.clone()]);

        let levels = forest.expected_levels();
        assert!(levels.is_empty());

        let violations = forest.audit();
        assert!(violations.contains(&InvariantViolation::Cycle { node_id: a.id }));
        assert!(violations.contains(&InvariantViolation::Cycle { node_id: b.id }));
        assert!(violations.contains(&InvariantViolation::DanglingSupplier {
            node_id: c.id,
            supplier_id: missing
        }));
    }

    #[test]
    fn test_audit_reports_factory_with_supplier() {
        let f = node("F", NodeType::Factory, None, 0);
        let bad = node("F2", NodeType::Factory, Some(&f), 1);
        let forest = SupplierForest::new(vec![f.clone(), bad.clone()]);

        assert_eq!(
            forest.audit(),
            vec![InvariantViolation::FactoryWithSupplier {
                node_id: bad.id,
                supplier_id: f.id
            }]
        );
    }
}

//! Evaluation ordering and circular dependency detection.
//!
//! A depth-first traversal over the registry's reverse edges (referenced cell
//! to dependent) yields a reverse-postorder: every cell appears after all the
//! cells its formula references. Reaching a cell that is still on the
//! current path closes a cycle. Lowlinks are tracked on the same traversal,
//! so every strongly connected component with more than one cell (or a
//! self-reference) is reported as tainted and the caller can fix its cells
//! to `Error`.
//!
//! The traversal keeps its own frame stack instead of recursing, so deep
//! reference chains cannot overflow the call stack.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::cell_ref::CellRef;
use super::deps::{FormulaRegistry, NodeId};

/// Which cells are tainted when a cycle is detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleMarking {
    /// Every cell of each reference cycle (strongly connected component).
    #[default]
    Members,
    /// Every cell on the traversal path when the cycle is found, including
    /// upstream cells that merely lead into it.
    ActivePath,
}

impl std::str::FromStr for CycleMarking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "members" => Ok(CycleMarking::Members),
            "active-path" => Ok(CycleMarking::ActivePath),
            other => Err(format!(
                "Unknown cycle marking '{}' (expected 'members' or 'active-path')",
                other
            )),
        }
    }
}

/// Result of ordering a registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Every registered cell, referenced cells before their dependents.
    pub order: Vec<CellRef>,
    /// Cells whose value must be forced to `Error`, in detection order.
    pub tainted: Vec<CellRef>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Finished,
}

struct Frame {
    node: NodeId,
    next_child: usize,
}

/// Discovery index and lowlink bookkeeping for strongly connected
/// components, kept alongside the traversal.
struct Components {
    next_index: usize,
    index: Vec<usize>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    self_loop: Vec<bool>,
    stack: Vec<NodeId>,
}

impl Components {
    fn new(n: usize) -> Self {
        Components {
            next_index: 0,
            index: vec![0; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            self_loop: vec![false; n],
            stack: Vec::new(),
        }
    }

    fn enter(&mut self, node: NodeId) {
        self.index[node] = self.next_index;
        self.lowlink[node] = self.next_index;
        self.next_index += 1;
        self.on_stack[node] = true;
        self.stack.push(node);
    }

    /// Record an edge to a node that is already on the component stack.
    fn back_edge(&mut self, from: NodeId, to: NodeId) {
        if from == to {
            self.self_loop[from] = true;
        }
        self.lowlink[from] = self.lowlink[from].min(self.index[to]);
    }

    /// Close `node`. Returns its component when `node` is the component root
    /// and the component is cyclic.
    fn leave(&mut self, node: NodeId, parent: Option<NodeId>) -> Option<Vec<NodeId>> {
        if let Some(parent) = parent {
            self.lowlink[parent] = self.lowlink[parent].min(self.lowlink[node]);
        }
        if self.lowlink[node] != self.index[node] {
            return None;
        }
        let mut members = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack[member] = false;
            members.push(member);
            if member == node {
                break;
            }
        }
        if members.len() > 1 || self.self_loop[node] {
            members.reverse();
            Some(members)
        } else {
            None
        }
    }
}

/// Compute an evaluation order for every registered cell and collect the
/// cells implicated in reference cycles.
pub fn resolve_order(registry: &FormulaRegistry, marking: CycleMarking) -> Resolution {
    let n = registry.len();
    let mut state = vec![VisitState::Unvisited; n];
    let mut finished: Vec<NodeId> = Vec::with_capacity(n);
    let mut tainted: Vec<NodeId> = Vec::new();
    let mut seen_tainted: HashSet<NodeId> = HashSet::new();
    let mut components = Components::new(n);
    let mut stack: Vec<Frame> = Vec::new();

    let mut taint = |ids: &[NodeId], tainted: &mut Vec<NodeId>| {
        tracing::warn!(
            cell = %registry.entry(ids[0]).cell,
            implicated = ids.len(),
            "reference cycle detected"
        );
        for &id in ids {
            if seen_tainted.insert(id) {
                tainted.push(id);
            }
        }
    };

    for root in 0..n {
        if state[root] != VisitState::Unvisited {
            continue;
        }
        state[root] = VisitState::InProgress;
        components.enter(root);
        stack.push(Frame {
            node: root,
            next_child: 0,
        });

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let Some(&child) = registry.entry(node).dependents.get(frame.next_child) else {
                state[node] = VisitState::Finished;
                finished.push(node);
                stack.pop();
                let parent = stack.last().map(|f| f.node);
                if let Some(members) = components.leave(node, parent) {
                    if marking == CycleMarking::Members {
                        taint(&members, &mut tainted);
                    }
                }
                continue;
            };
            frame.next_child += 1;

            match state[child] {
                VisitState::Unvisited => {
                    tracing::trace!(
                        from = %registry.entry(node).cell,
                        to = %registry.entry(child).cell,
                        "descending"
                    );
                    state[child] = VisitState::InProgress;
                    components.enter(child);
                    stack.push(Frame {
                        node: child,
                        next_child: 0,
                    });
                }
                VisitState::InProgress => {
                    components.back_edge(node, child);
                    if marking == CycleMarking::ActivePath {
                        let path: Vec<NodeId> = stack.iter().map(|f| f.node).collect();
                        taint(&path, &mut tainted);
                    }
                }
                VisitState::Finished => {
                    // Finished but still on the component stack: same cycle.
                    if components.on_stack[child] {
                        components.back_edge(node, child);
                    }
                }
            }
        }
    }

    let cell_of = |id: NodeId| registry.entry(id).cell;
    Resolution {
        order: finished.into_iter().rev().map(cell_of).collect(),
        tainted: tainted.into_iter().map(cell_of).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn position(order: &[CellRef], name: &str) -> usize {
        order.iter().position(|c| *c == cell(name)).unwrap()
    }

    #[test]
    fn test_chain_is_ordered_before_dependents() {
        let mut registry = FormulaRegistry::new();
        registry.register(cell("A2"), "A1 1 +");
        registry.register(cell("A1"), "A0 1 +");
        registry.register(cell("B0"), "A2 A0 *");

        let resolution = resolve_order(&registry, CycleMarking::Members);
        assert!(resolution.tainted.is_empty());
        assert_eq!(resolution.order.len(), registry.len());
        assert!(position(&resolution.order, "A0") < position(&resolution.order, "A1"));
        assert!(position(&resolution.order, "A1") < position(&resolution.order, "A2"));
        assert!(position(&resolution.order, "A2") < position(&resolution.order, "B0"));
        assert!(position(&resolution.order, "A0") < position(&resolution.order, "B0"));
    }

    #[test]
    fn test_two_cell_cycle_is_tainted() {
        let mut registry = FormulaRegistry::new();
        registry.register(cell("A0"), "A1 1 +");
        registry.register(cell("A1"), "A0 1 +");

        let resolution = resolve_order(&registry, CycleMarking::Members);
        let tainted: HashSet<_> = resolution.tainted.into_iter().collect();
        assert_eq!(tainted, HashSet::from([cell("A0"), cell("A1")]));
    }

    #[test]
    fn test_self_reference_is_tainted() {
        let mut registry = FormulaRegistry::new();
        registry.register(cell("C3"), "C3 1 +");

        let resolution = resolve_order(&registry, CycleMarking::Members);
        assert_eq!(resolution.tainted, vec![cell("C3")]);
        assert_eq!(resolution.order, vec![cell("C3")]);
    }

    #[test]
    fn test_members_marking_spares_upstream_and_downstream() {
        let mut registry = FormulaRegistry::new();
        // A0 feeds the cycle B0 <-> B1, and C0 reads from it.
        registry.register(cell("B0"), "A0 B1 +");
        registry.register(cell("B1"), "B0 1 +");
        registry.register(cell("C0"), "B1 1 +");

        let resolution = resolve_order(&registry, CycleMarking::Members);
        let tainted: HashSet<_> = resolution.tainted.into_iter().collect();
        assert_eq!(tainted, HashSet::from([cell("B0"), cell("B1")]));
    }

    #[test]
    fn test_members_marking_covers_cycle_closed_through_finished_cell() {
        let mut registry = FormulaRegistry::new();
        // A0 -> C0 -> B0 -> A0, and B0 also reads C0 directly. C0 finishes
        // before B0 reaches it, so the whole component must still be found.
        registry.register(cell("A0"), "B0 1 +");
        registry.register(cell("B0"), "A0 C0 +");
        registry.register(cell("C0"), "A0 1 +");

        let resolution = resolve_order(&registry, CycleMarking::Members);
        let tainted: HashSet<_> = resolution.tainted.into_iter().collect();
        assert_eq!(tainted, HashSet::from([cell("A0"), cell("B0"), cell("C0")]));
    }

    #[test]
    fn test_members_marking_reports_separate_cycles() {
        let mut registry = FormulaRegistry::new();
        registry.register(cell("A0"), "A1 1 +");
        registry.register(cell("A1"), "A0 1 +");
        registry.register(cell("B0"), "A1 B1 +");
        registry.register(cell("B1"), "B0 1 +");
        registry.register(cell("C0"), "B1 1 +");

        let resolution = resolve_order(&registry, CycleMarking::Members);
        let tainted: HashSet<_> = resolution.tainted.into_iter().collect();
        assert_eq!(
            tainted,
            HashSet::from([cell("A0"), cell("A1"), cell("B0"), cell("B1")])
        );
    }

    #[test]
    fn test_active_path_marking_depends_on_traversal_root() {
        let mut registry = FormulaRegistry::new();
        registry.register(cell("B0"), "A0 B1 +");
        registry.register(cell("B1"), "B0 1 +");

        // B0 is registered first, so traversal starts there and the cycle
        // closes before A0 is reached.
        let resolution = resolve_order(&registry, CycleMarking::ActivePath);
        let tainted: HashSet<_> = resolution.tainted.into_iter().collect();
        assert_eq!(tainted, HashSet::from([cell("B0"), cell("B1")]));

        let mut registry = FormulaRegistry::new();
        registry.register(cell("B1"), "B0 1 +");
        registry.register(cell("B0"), "A0 B1 +");
        registry.register(cell("Z9"), "A0 1 +");

        // B1 is the first root, so the path at detection time is B1 -> B0
        // and A0 is spared again.
        let resolution = resolve_order(&registry, CycleMarking::ActivePath);
        assert!(!resolution.tainted.contains(&cell("A0")));
    }

    #[test]
    fn test_active_path_marking_taints_traversal_root() {
        let mut registry = FormulaRegistry::new();
        // X0 gives A0 an earlier arena slot than B0, so traversal roots at A0
        // and walks A0 -> B0 -> B1 -> B0.
        registry.register(cell("X0"), "A0 1 +");
        registry.register(cell("B0"), "A0 B1 +");
        registry.register(cell("B1"), "B0 1 +");

        let members = resolve_order(&registry, CycleMarking::Members);
        assert!(!members.tainted.contains(&cell("A0")));

        let path = resolve_order(&registry, CycleMarking::ActivePath);
        assert!(path.tainted.contains(&cell("A0")));
        assert!(path.tainted.contains(&cell("B0")));
        assert!(path.tainted.contains(&cell("B1")));
        assert!(!path.tainted.contains(&cell("X0")));
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut registry = FormulaRegistry::new();
        let depth = 200_000;
        for row in 1..=depth {
            registry.register(CellRef::new(0, row), &format!("A{} 1 +", row - 1));
        }
        let resolution = resolve_order(&registry, CycleMarking::Members);
        assert!(resolution.tainted.is_empty());
        assert_eq!(resolution.order.first(), Some(&CellRef::new(0, 0)));
        assert_eq!(resolution.order.last(), Some(&CellRef::new(0, depth)));
    }

    #[test]
    fn test_cycle_marking_from_str() {
        assert_eq!("members".parse(), Ok(CycleMarking::Members));
        assert_eq!("active-path".parse(), Ok(CycleMarking::ActivePath));
        assert!("all".parse::<CycleMarking>().is_err());
    }
}

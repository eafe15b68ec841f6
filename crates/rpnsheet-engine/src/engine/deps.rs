//! Dependency extraction and the formula registry.
//!
//! Formulas are registered together with their reverse edges: every cell
//! referenced by a formula records the formula's cell as a dependent, so the
//! edge direction reads "resolve this before each dependent".

use std::collections::HashMap;

use super::cell_ref::{CellRef, is_reference_token};

/// Index of an entry in the [`FormulaRegistry`] arena.
pub type NodeId = usize;

/// Extract all cell references from a formula, in token order.
///
/// Address-shaped tokens whose column or row overflow are skipped; the
/// substitution step reports them.
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    formula
        .split_whitespace()
        .filter(|token| is_reference_token(token))
        .filter_map(CellRef::from_str)
        .collect()
}

/// A registered cell: its formula text (if it has one) and its dependents.
#[derive(Clone, Debug)]
pub struct FormulaEntry {
    pub cell: CellRef,
    /// `None` for cells that are only ever referenced.
    pub text: Option<String>,
    pub dependents: Vec<NodeId>,
}

/// Arena of formula entries indexed by cell.
///
/// Insertion order is kept so traversal over the registry is deterministic.
#[derive(Clone, Debug, Default)]
pub struct FormulaRegistry {
    entries: Vec<FormulaEntry>,
    index: HashMap<CellRef, NodeId>,
}

impl FormulaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `formula` as the contents of `cell` and record its edges.
    pub fn register(&mut self, cell: CellRef, formula: &str) -> NodeId {
        let id = self.node_for(cell);
        self.entries[id].text = Some(formula.to_string());

        for dep in extract_dependencies(formula) {
            let dep_id = self.node_for(dep);
            let dependents = &mut self.entries[dep_id].dependents;
            // Edges from one formula are pushed together, so a repeated
            // reference can only sit at the end.
            if dependents.last() != Some(&id) {
                dependents.push(id);
            }
        }
        id
    }

    fn node_for(&mut self, cell: CellRef) -> NodeId {
        if let Some(&id) = self.index.get(&cell) {
            return id;
        }
        let id = self.entries.len();
        self.entries.push(FormulaEntry {
            cell,
            text: None,
            dependents: Vec::new(),
        });
        self.index.insert(cell, id);
        id
    }

    pub fn id_of(&self, cell: &CellRef) -> Option<NodeId> {
        self.index.get(cell).copied()
    }

    pub fn entry(&self, id: NodeId) -> &FormulaEntry {
        &self.entries[id]
    }

    pub fn entry_mut(&mut self, id: NodeId) -> &mut FormulaEntry {
        &mut self.entries[id]
    }

    pub fn get(&self, cell: &CellRef) -> Option<&FormulaEntry> {
        self.id_of(cell).map(|id| &self.entries[id])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

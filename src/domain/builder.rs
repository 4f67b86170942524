//! Forest builder: links flat company records into parent/child trees.

use std::collections::HashSet;

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{CompanyNode, Forest};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{CompanyId, CompanyRecord, ExpenseTotals};

/// Constructs a company forest from flat records and per-company expenses.
#[derive(Debug, Default)]
pub struct ForestBuilder {
    expenses: ExpenseTotals,
    strict_expenses: bool,
}

impl ForestBuilder {
    pub fn new(expenses: ExpenseTotals) -> Self {
        Self {
            expenses,
            strict_expenses: false,
        }
    }

    /// Reject travel totals whose company is not part of the input.
    pub fn strict_expenses(mut self, strict: bool) -> Self {
        self.strict_expenses = strict;
        self
    }

    /// Build the forest.
    ///
    /// Nodes are created first and linked in a second pass, so a child may
    /// precede its parent in `companies`. Roots keep their input order.
    #[instrument(level = "debug", skip(self, companies), fields(companies = companies.len()))]
    pub fn build(&self, companies: &[CompanyRecord]) -> DomainResult<Forest> {
        let mut forest = Forest::with_capacity(companies.len());

        // First pass: one node per company, nothing linked yet
        let mut pending = Vec::new();
        for record in companies {
            let internal_cost = self.expenses.get(&record.id);
            let parent_id = record.parent_id.clone();
            let idx = forest.insert_node(CompanyNode::new(record.clone(), internal_cost))?;
            if let Some(parent_id) = parent_id {
                pending.push((idx, record.id.clone(), parent_id));
            }
        }

        self.check_expenses(&forest)?;

        // Second pass: hang every non-root under its parent
        for (child_idx, child_id, parent_id) in pending {
            if child_id == parent_id {
                return Err(DomainError::CyclicAncestry(child_id));
            }
            let parent_idx =
                forest
                    .index_of(&parent_id)
                    .ok_or_else(|| DomainError::DanglingParent {
                        child: child_id.clone(),
                        parent: parent_id.clone(),
                    })?;
            forest.attach_child(parent_idx, child_idx)?;
        }

        Self::check_acyclic(&forest)?;

        debug!(
            "built forest: {} companies, {} roots",
            forest.len(),
            forest.roots().len()
        );
        Ok(forest)
    }

    fn check_expenses(&self, forest: &Forest) -> DomainResult<()> {
        let unknown: Vec<&CompanyId> = self
            .expenses
            .iter()
            .map(|(id, _)| id)
            .filter(|id| forest.index_of(id).is_none())
            .sorted()
            .collect();

        if unknown.is_empty() {
            return Ok(());
        }
        if self.strict_expenses {
            return Err(DomainError::UnknownCompany(unknown[0].clone()));
        }
        warn!(
            "ignoring travel expenses of unknown companies: {}",
            unknown.iter().join(", ")
        );
        Ok(())
    }

    /// Every node must be reachable from a root. A node that is not hangs
    /// off a parent chain that loops back on itself.
    fn check_acyclic(forest: &Forest) -> DomainResult<()> {
        let mut visited: HashSet<Index> = HashSet::with_capacity(forest.len());
        let mut stack: Vec<Index> = forest.roots().to_vec();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                let node = forest.get_node(current).ok_or(DomainError::NodeNotFound)?;
                return Err(DomainError::CyclicAncestry(node.id.clone()));
            }
            if let Some(node) = forest.get_node(current) {
                stack.extend(node.children.iter().copied());
            }
        }

        if visited.len() == forest.len() {
            return Ok(());
        }

        let stray = forest
            .iter_all()
            .find(|(idx, _)| !visited.contains(idx))
            .map(|(_, node)| node.id.clone())
            .ok_or(DomainError::NodeNotFound)?;
        Err(DomainError::CyclicAncestry(Self::cycle_member(forest, stray)?))
    }

    /// Follow parent ids from `start` until one repeats; that id is on the cycle.
    fn cycle_member(forest: &Forest, start: CompanyId) -> DomainResult<CompanyId> {
        let mut seen = HashSet::new();
        let mut current = start;
        while seen.insert(current.clone()) {
            let node = forest.node_by_id(&current).ok_or(DomainError::NodeNotFound)?;
            current = match &node.parent_id {
                Some(parent) => parent.clone(),
                None => return Err(DomainError::NodeNotFound),
            };
        }
        Ok(current)
    }
}

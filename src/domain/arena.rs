use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use rust_decimal::Decimal;
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{CompanyId, CompanyRecord};

/// Memo of a node's effective cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostState {
    Uncomputed,
    /// On the current computation stack; meeting it again means a cycle
    InProgress,
    Computed(Decimal),
}

/// One company in the forest.
#[derive(Debug)]
pub struct CompanyNode {
    pub id: CompanyId,
    pub created_at: String,
    pub name: String,
    /// Lookup key only, never followed during traversal
    pub parent_id: Option<CompanyId>,
    /// Indices of child nodes in the arena
    pub children: Vec<Index>,
    internal_cost: Decimal,
    cost: CostState,
}

impl CompanyNode {
    pub fn new(record: CompanyRecord, internal_cost: Decimal) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            name: record.name,
            parent_id: record.parent_id,
            children: Vec::new(),
            internal_cost,
            cost: CostState::Uncomputed,
        }
    }

    /// Direct cost, fixed at construction.
    pub fn internal_cost(&self) -> Decimal {
        self.internal_cost
    }

    pub fn cost_state(&self) -> CostState {
        self.cost
    }

    /// Effective cost if it has been computed already.
    pub fn cached_cost(&self) -> Option<Decimal> {
        match self.cost {
            CostState::Computed(cost) => Some(cost),
            _ => None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for CompanyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Arena-based forest of companies.
///
/// Parents own their children through index lists; every company lives in
/// the arena exactly once and is reachable by id in O(1).
#[derive(Debug, Default)]
pub struct Forest {
    arena: Arena<CompanyNode>,
    by_id: HashMap<CompanyId, Index>,
    /// Root indices in first-seen input order
    roots: Vec<Index>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            by_id: HashMap::with_capacity(capacity),
            roots: Vec::new(),
        }
    }

    /// Store a node without linking it. Roots are remembered in insertion order.
    #[instrument(level = "trace", skip(self, node), fields(id = %node.id))]
    pub(crate) fn insert_node(&mut self, node: CompanyNode) -> DomainResult<Index> {
        if self.by_id.contains_key(&node.id) {
            return Err(DomainError::DuplicateCompany(node.id));
        }
        let id = node.id.clone();
        let is_root = node.is_root();
        let idx = self.arena.insert(node);
        self.by_id.insert(id, idx);
        if is_root {
            self.roots.push(idx);
        }
        Ok(idx)
    }

    /// Append `child` to `parent`'s children.
    pub(crate) fn attach_child(&mut self, parent: Index, child: Index) -> DomainResult<()> {
        let parent = self.arena.get_mut(parent).ok_or(DomainError::NodeNotFound)?;
        parent.children.push(child);
        Ok(())
    }

    pub fn get_node(&self, idx: Index) -> Option<&CompanyNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: &CompanyId) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn node_by_id(&self, id: &CompanyId) -> Option<&CompanyNode> {
        self.index_of(id).and_then(|idx| self.get_node(idx))
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn root_nodes(&self) -> impl Iterator<Item = &CompanyNode> {
        self.roots.iter().filter_map(|&idx| self.arena.get(idx))
    }

    /// Every node, in insertion order.
    pub fn iter_all(&self) -> impl Iterator<Item = (Index, &CompanyNode)> {
        self.arena.iter()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Effective cost of a node: its internal cost plus the effective cost of
    /// every child, computed once and cached on the node.
    ///
    /// A node met again while its own computation is still running is part of
    /// a cycle and yields `CyclicAncestry`. On error every node left
    /// `InProgress` goes back to `Uncomputed`.
    #[instrument(level = "trace", skip(self))]
    pub fn effective_cost(&mut self, idx: Index) -> DomainResult<Decimal> {
        let mut frames = Vec::new();
        let result = self.fold_costs(idx, &mut frames);
        if result.is_err() {
            for frame in frames {
                if let Some(node) = self.arena.get_mut(frame.idx) {
                    node.cost = CostState::Uncomputed;
                }
            }
        }
        result
    }

    /// Effective cost of the company with the given id.
    pub fn effective_cost_of(&mut self, id: &CompanyId) -> DomainResult<Decimal> {
        let idx = self.index_of(id).ok_or(DomainError::NodeNotFound)?;
        self.effective_cost(idx)
    }

    /// Compute the effective cost of every root, and with it every node.
    ///
    /// Returns the sum over all roots, saturating at `Decimal::MAX`.
    #[instrument(level = "debug", skip(self))]
    pub fn compute_all(&mut self) -> DomainResult<Decimal> {
        let mut total = Decimal::ZERO;
        for i in 0..self.roots.len() {
            let cost = self.effective_cost(self.roots[i])?;
            total = total.saturating_add(cost);
        }
        Ok(total)
    }

    /// Depth-first fold on an explicit stack; `frames` holds the open
    /// (`InProgress`) nodes from `start` down to the current one.
    fn fold_costs(&mut self, start: Index, frames: &mut Vec<CostFrame>) -> DomainResult<Decimal> {
        if let Some(cost) = self.enter(start, frames)? {
            return Ok(cost);
        }

        loop {
            let frame = frames.last_mut().ok_or(DomainError::NodeNotFound)?;
            let next_child = self
                .arena
                .get(frame.idx)
                .ok_or(DomainError::NodeNotFound)?
                .children
                .get(frame.next_child)
                .copied();

            match next_child {
                Some(child) => {
                    frame.next_child += 1;
                    if let Some(cost) = self.enter(child, frames)? {
                        self.add_to_parent(frames, cost)?;
                    }
                }
                None => {
                    let done = frames.pop().ok_or(DomainError::NodeNotFound)?;
                    let node = self.arena.get_mut(done.idx).ok_or(DomainError::NodeNotFound)?;
                    node.cost = CostState::Computed(done.total);
                    trace!(id = %node.id, cost = %done.total, "cost computed");

                    if frames.is_empty() {
                        return Ok(done.total);
                    }
                    self.add_to_parent(frames, done.total)?;
                }
            }
        }
    }

    /// Cached cost of `idx`, or `None` after opening a new frame for it.
    fn enter(&mut self, idx: Index, frames: &mut Vec<CostFrame>) -> DomainResult<Option<Decimal>> {
        let node = self.arena.get_mut(idx).ok_or(DomainError::NodeNotFound)?;
        match node.cost {
            CostState::Computed(cost) => Ok(Some(cost)),
            CostState::InProgress => Err(DomainError::CyclicAncestry(node.id.clone())),
            CostState::Uncomputed => {
                node.cost = CostState::InProgress;
                frames.push(CostFrame {
                    idx,
                    next_child: 0,
                    total: node.internal_cost,
                });
                Ok(None)
            }
        }
    }

    fn add_to_parent(&self, frames: &mut [CostFrame], cost: Decimal) -> DomainResult<()> {
        if let Some(parent) = frames.last_mut() {
            let idx = parent.idx;
            parent.total = parent
                .total
                .checked_add(cost)
                .ok_or_else(|| self.overflow_at(idx))?;
        }
        Ok(())
    }

    fn overflow_at(&self, idx: Index) -> DomainError {
        match self.arena.get(idx) {
            Some(node) => DomainError::CostOverflow(node.id.clone()),
            None => DomainError::NodeNotFound,
        }
    }

    /// Number of levels below and including `root`.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self, root: Index) -> usize {
        self.iter_postorder(root)
            .fold(HashMap::<Index, usize>::new(), |mut depths, (idx, node)| {
                let below = node
                    .children
                    .iter()
                    .filter_map(|child| depths.get(child))
                    .max()
                    .copied()
                    .unwrap_or(0);
                depths.insert(idx, below + 1);
                depths
            })
            .get(&root)
            .copied()
            .unwrap_or(0)
    }

    /// Ids of all companies without children below `root`.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_ids(&self, root: Index) -> Vec<CompanyId> {
        self.iter(root)
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.id.clone())
            .collect()
    }

    /// Pre-order traversal of the subtree under `root`, children left to right.
    pub fn iter(&self, root: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, root)
    }

    /// Post-order traversal of the subtree under `root`: children before parents.
    pub fn iter_postorder(&self, root: Index) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, root)
    }
}

/// A node whose cost is being folded: children consumed so far and running sum.
struct CostFrame {
    idx: Index,
    next_child: usize,
    total: Decimal,
}

pub struct TreeIterator<'a> {
    forest: &'a Forest,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(forest: &'a Forest, root: Index) -> Self {
        Self {
            forest,
            stack: vec![root],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a CompanyNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    forest: &'a Forest,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(forest: &'a Forest, root: Index) -> Self {
        Self {
            forest,
            stack: vec![(root, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a CompanyNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

//! The incremental join network.
//!
//! Query nodes live in an arena and refer to each other by [`QueryId`]. A
//! chain of `where`/`filter` calls builds a path of nodes hanging off a top
//! node; union nodes join several paths back together. Every node keeps its
//! current result rows, and new triples flow through the network as deltas:
//!
//! - *right activation*: a pattern node's alpha memory gained a match. A plain
//!   node joins it against the parent's rows and forwards only that delta. An
//!   optional node cannot do that, since a new match can retract a row that
//!   used to pass through unmatched, so it resets its subtree and recomputes.
//! - *left activation*: a parent produced rows. The node combines them with
//!   its own alpha memory (pattern), tests them (predicate), or re-reads its
//!   members (union), and forwards whatever is new.
//!
//! Rows are kept in an `IndexSet`, so each row appears once and in the order
//! it was first produced.
//!
//! Resetting an optional node costs the size of its subtree, and a chain of
//! optional nodes can reset repeatedly, so one insertion is bounded by subtree
//! size times depth.

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::filter::FilterInput;
use crate::id::{BankId, NumericId, QueryId, TripleId};
use crate::pattern::{join_all, Match, Pattern};
use crate::pool::TermPool;
use crate::triple::Triple;

#[derive(Debug)]
pub enum NodeKind {
    /// The head of a chain. Reports no rows of its own, but offers its
    /// children the single empty match.
    Top,
    Pattern {
        pattern: Pattern,
        optional: bool,
        /// Matches of `pattern` against every triple the databank has seen.
        alpha: IndexSet<Match>,
    },
    Predicate(FilterInput),
    Union { members: Vec<QueryId> },
}

#[derive(Debug)]
pub struct QueryNode {
    bank: BankId,
    parent: Option<QueryId>,
    kind: NodeKind,
    children: Vec<QueryId>,
    part_of: Vec<QueryId>,
    rows: IndexSet<Match>,
}

impl QueryNode {
    fn new(bank: BankId, parent: Option<QueryId>, kind: NodeKind) -> Self {
        Self {
            bank,
            parent,
            kind,
            children: Vec::new(),
            part_of: Vec::new(),
            rows: IndexSet::new(),
        }
    }

    pub fn bank(&self) -> BankId {
        self.bank
    }

    pub fn parent(&self) -> Option<QueryId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[QueryId] {
        &self.children
    }

    /// Union nodes this node is a member of.
    pub fn part_of(&self) -> &[QueryId] {
        &self.part_of
    }

    pub fn rows(&self) -> &IndexSet<Match> {
        &self.rows
    }

    pub fn is_top(&self) -> bool {
        matches!(self.kind, NodeKind::Top)
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, NodeKind::Union { .. })
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, NodeKind::Pattern { optional: true, .. })
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        match &self.kind {
            NodeKind::Pattern { pattern, .. } => Some(pattern),
            _ => None,
        }
    }

    pub fn alpha(&self) -> Option<&IndexSet<Match>> {
        match &self.kind {
            NodeKind::Pattern { alpha, .. } => Some(alpha),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Network {
    nodes: Vec<QueryNode>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: QueryId) -> &QueryNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: QueryId) -> &mut QueryNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn rows(&self, id: QueryId) -> &IndexSet<Match> {
        &self.node(id).rows
    }

    fn push(&mut self, node: QueryNode) -> QueryId {
        let id = QueryId::from_usize(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn attach(&mut self, parent: QueryId, node: QueryNode) -> QueryId {
        let id = self.push(node);
        self.node_mut(parent).children.push(id);
        id
    }

    pub fn add_top(&mut self, bank: BankId) -> QueryId {
        let id = self.push(QueryNode::new(bank, None, NodeKind::Top));
        debug!(query = ?id, ?bank, "top node");
        id
    }

    /// Hang a pattern node off `parent`. `alpha` must already hold the matches
    /// of every triple in the databank.
    pub fn add_pattern(
        &mut self,
        parent: QueryId,
        pattern: Pattern,
        optional: bool,
        alpha: IndexSet<Match>,
        pool: &TermPool,
    ) -> QueryId {
        let bank = self.node(parent).bank;
        let kind = NodeKind::Pattern {
            pattern,
            optional,
            alpha,
        };
        let id = self.attach(parent, QueryNode::new(bank, Some(parent), kind));
        debug!(query = ?id, ?parent, optional, "pattern node");
        self.left_activate(id, None, pool);
        id
    }

    pub fn add_predicate(&mut self, parent: QueryId, filter: FilterInput, pool: &TermPool) -> QueryId {
        let bank = self.node(parent).bank;
        let kind = NodeKind::Predicate(filter);
        let id = self.attach(parent, QueryNode::new(bank, Some(parent), kind));
        debug!(query = ?id, ?parent, "predicate node");
        self.left_activate(id, None, pool);
        id
    }

    pub fn add_union(&mut self, members: &[QueryId], bank: BankId, pool: &TermPool) -> QueryId {
        let kind = NodeKind::Union {
            members: members.to_vec(),
        };
        let id = self.push(QueryNode::new(bank, None, kind));
        for member in members {
            self.node_mut(*member).part_of.push(id);
        }
        debug!(query = ?id, ?members, "union node");
        self.left_activate(id, None, pool);
        id
    }

    /// Add `member` to an existing union node and recompute it.
    pub fn extend_union(&mut self, union: QueryId, member: QueryId, bank: BankId, pool: &TermPool) {
        let node = self.node_mut(union);
        if let NodeKind::Union { members } = &mut node.kind {
            if members.contains(&member) {
                return;
            }
            members.push(member);
        }
        node.bank = bank;
        self.node_mut(member).part_of.push(union);
        debug!(query = ?union, ?member, "extended union");
        self.left_activate(union, None, pool);
    }

    /// Whether `target` is reachable from `from` through children and unions.
    pub fn is_downstream(&self, from: QueryId, target: QueryId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            let node = self.node(id);
            stack.extend(node.children.iter().chain(&node.part_of).copied());
        }
        false
    }

    /// A new triple reached a pattern node through its databank's index.
    pub fn notify(&mut self, id: QueryId, triple_id: TripleId, triple: &Triple, pool: &TermPool) {
        let NodeKind::Pattern { pattern, alpha, .. } = &mut self.node_mut(id).kind else {
            return;
        };
        let Some(m) = pattern.matches(triple_id, triple) else {
            return;
        };
        if !alpha.insert(m.clone()) {
            return;
        }
        trace!(query = ?id, triple = ?triple_id, "alpha match");
        self.right_activate(id, m, pool);
    }

    fn right_activate(&mut self, id: QueryId, m: Match, pool: &TermPool) {
        let node = self.node(id);
        if node.is_optional() {
            let mut unions = Vec::new();
            self.reset(id, &mut unions);
            self.left_activate(id, None, pool);
            for union in unions {
                self.left_activate(union, None, pool);
            }
        } else {
            let input = self.input_rows(node.parent);
            let delta = join_all(&input, std::slice::from_ref(&m), false);
            self.update(id, delta, pool);
        }
    }

    /// Rows offered by `parent`. A top node offers the empty match.
    fn input_rows(&self, parent: Option<QueryId>) -> Vec<Match> {
        match parent {
            Some(p) if !self.node(p).is_top() => self.node(p).rows.iter().cloned().collect(),
            _ => vec![Match::empty()],
        }
    }

    /// Recompute a node from `input` (new parent rows), or from its parent's
    /// full rows when `input` is `None`.
    fn left_activate(&mut self, id: QueryId, input: Option<Vec<Match>>, pool: &TermPool) {
        let node = self.node(id);
        let rows = match &node.kind {
            NodeKind::Top => return,
            NodeKind::Pattern {
                alpha, optional, ..
            } => {
                let input = input.unwrap_or_else(|| self.input_rows(node.parent));
                join_all(&input, alpha, *optional)
            }
            NodeKind::Predicate(filter) => {
                let input = input.unwrap_or_else(|| self.input_rows(node.parent));
                input
                    .into_iter()
                    .filter(|row| filter.test(&row.bindings, pool))
                    .collect()
            }
            NodeKind::Union { members } => members
                .iter()
                .flat_map(|m| self.node(*m).rows.iter().cloned())
                .collect(),
        };
        self.update(id, rows, pool);
    }

    /// Record rows at `id` and push the new ones downstream.
    fn update(&mut self, id: QueryId, rows: Vec<Match>, pool: &TermPool) {
        let node = self.node_mut(id);
        let fresh: Vec<Match> = rows
            .into_iter()
            .filter(|row| node.rows.insert(row.clone()))
            .collect();
        if fresh.is_empty() {
            return;
        }
        trace!(query = ?id, rows = fresh.len(), "propagating");
        let children = node.children.clone();
        let part_of = node.part_of.clone();
        for child in children {
            self.left_activate(child, Some(fresh.clone()), pool);
        }
        for union in part_of {
            self.left_activate(union, None, pool);
        }
    }

    /// Clear the rows of `id` and everything downstream of it. Unions reached
    /// along the way are collected so they can be rebuilt afterwards even if
    /// `id` ends up producing nothing.
    fn reset(&mut self, id: QueryId, unions: &mut Vec<QueryId>) {
        let node = self.node_mut(id);
        node.rows.clear();
        let children = node.children.clone();
        let part_of = node.part_of.clone();
        for child in children {
            self.reset(child, unions);
        }
        for union in part_of {
            if !unions.contains(&union) {
                unions.push(union);
            }
            self.reset(union, unions);
        }
    }
}

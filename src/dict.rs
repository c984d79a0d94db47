// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Ordered dictionary backed by an AVL tree.
//
// Nodes live in an arena and carry parent pointers, so in-order navigation
// from any node needs no auxiliary stack. Node handles stay valid until the
// node itself is deleted: deleting a node with two children relinks its
// successor into its place instead of moving keys between nodes.
//
// The tree never stores a comparator. `Dict` takes one per call (`*_by`),
// which lets the sweep compare regions against state it borrows separately;
// `OrderedDict` owns one for ordinary use.

use std::cmp::Ordering;
use std::ops::Deref;

use crate::arena::{Arena, Id};

/// Strict ordering injected into the dictionary.
pub trait Compare<K> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

impl<K, F> Compare<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Orders keys by their `Ord` implementation.
#[derive(Copy, Clone, Debug, Default)]
pub struct NaturalOrder;

impl<K: Ord> Compare<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

pub struct Node<K> {
    key: K,
    left: Option<NodeId<K>>,
    right: Option<NodeId<K>>,
    parent: Option<NodeId<K>>,
    /// height(right) - height(left), always in -1..=1 between operations.
    balance: i8,
}

pub type NodeId<K> = Id<Node<K>>;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

pub struct Dict<K> {
    nodes: Arena<Node<K>>,
    root: Option<NodeId<K>>,
}

impl<K> Dict<K> {
    pub fn new() -> Self {
        Dict {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Number of keys stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub fn key(&self, node: NodeId<K>) -> &K {
        &self.nodes[node].key
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId<K>) -> bool {
        self.nodes.contains(node)
    }

    pub fn min(&self) -> Option<NodeId<K>> {
        self.root.map(|root| self.leftmost(root))
    }

    pub fn max(&self) -> Option<NodeId<K>> {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order successor. `None` wraps around to the minimum.
    pub fn next(&self, node: Option<NodeId<K>>) -> Option<NodeId<K>> {
        let Some(mut node) = node else {
            return self.min();
        };
        if let Some(right) = self.nodes[node].right {
            return Some(self.leftmost(right));
        }
        while let Some(parent) = self.nodes[node].parent {
            if self.nodes[parent].left == Some(node) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }

    /// In-order predecessor. `None` wraps around to the maximum.
    pub fn prev(&self, node: Option<NodeId<K>>) -> Option<NodeId<K>> {
        let Some(mut node) = node else {
            return self.max();
        };
        if let Some(left) = self.nodes[node].left {
            return Some(self.rightmost(left));
        }
        while let Some(parent) = self.nodes[node].parent {
            if self.nodes[parent].right == Some(node) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }

    /// Keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        let mut cursor = self.min();
        std::iter::from_fn(move || {
            let node = cursor?;
            cursor = self.next(Some(node));
            Some(&self.nodes[node].key)
        })
    }

    pub fn find_by<C: Compare<K> + ?Sized>(&self, key: &K, cmp: &C) -> Option<NodeId<K>> {
        let mut cursor = self.root;
        while let Some(node) = cursor {
            cursor = match cmp.compare(key, &self.nodes[node].key) {
                Ordering::Less => self.nodes[node].left,
                Ordering::Greater => self.nodes[node].right,
                Ordering::Equal => return Some(node),
            };
        }
        None
    }

    /// Smallest key strictly greater than `key`, which need not be present.
    pub fn find_next_by<C: Compare<K> + ?Sized>(&self, key: &K, cmp: &C) -> Option<NodeId<K>> {
        let mut best = None;
        let mut cursor = self.root;
        while let Some(node) = cursor {
            if cmp.compare(key, &self.nodes[node].key) == Ordering::Less {
                best = Some(node);
                cursor = self.nodes[node].left;
            } else {
                cursor = self.nodes[node].right;
            }
        }
        best
    }

    /// Largest key strictly smaller than `key`, which need not be present.
    pub fn find_prev_by<C: Compare<K> + ?Sized>(&self, key: &K, cmp: &C) -> Option<NodeId<K>> {
        let mut best = None;
        let mut cursor = self.root;
        while let Some(node) = cursor {
            if cmp.compare(key, &self.nodes[node].key) == Ordering::Greater {
                best = Some(node);
                cursor = self.nodes[node].right;
            } else {
                cursor = self.nodes[node].left;
            }
        }
        best
    }

    /// Insert `key`. When an equal key is already present nothing is
    /// inserted and its node is returned with `true`.
    pub fn insert_by<C: Compare<K> + ?Sized>(&mut self, key: K, cmp: &C) -> (NodeId<K>, bool) {
        let Some(mut cursor) = self.root else {
            let node = self.alloc(key, None);
            self.root = Some(node);
            return (node, false);
        };
        loop {
            let side = match cmp.compare(&key, &self.nodes[cursor].key) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return (cursor, true),
            };
            match self.child(cursor, side) {
                Some(child) => cursor = child,
                None => return (self.attach(cursor, side, key), false),
            }
        }
    }

    /// Insert `key` immediately before `node` in the in-order sequence,
    /// without consulting any comparator.
    pub fn insert_before(&mut self, node: NodeId<K>, key: K) -> NodeId<K> {
        match self.nodes[node].left {
            None => self.attach(node, Side::Left, key),
            Some(left) => {
                let parent = self.rightmost(left);
                self.attach(parent, Side::Right, key)
            }
        }
    }

    /// Remove the key equal to `key`, if present.
    pub fn delete_by<C: Compare<K> + ?Sized>(&mut self, key: &K, cmp: &C) -> Option<K> {
        let node = self.find_by(key, cmp)?;
        Some(self.delete_node(node))
    }

    /// Remove `node` and return its key. Other node handles stay valid.
    pub fn delete_node(&mut self, node: NodeId<K>) -> K {
        let (left, right, parent) = {
            let n = &self.nodes[node];
            (n.left, n.right, n.parent)
        };

        let retrace = match (left, right) {
            (Some(left), Some(right)) => {
                let succ = self.leftmost(right);
                let balance = self.nodes[node].balance;
                let start = if succ == right {
                    self.nodes[succ].left = Some(left);
                    self.nodes[left].parent = Some(succ);
                    (succ, Side::Right)
                } else {
                    let succ_parent = self.nodes[succ].parent.expect("successor has a parent");
                    let succ_right = self.nodes[succ].right;
                    self.nodes[succ_parent].left = succ_right;
                    if let Some(r) = succ_right {
                        self.nodes[r].parent = Some(succ_parent);
                    }
                    self.nodes[succ].left = Some(left);
                    self.nodes[succ].right = Some(right);
                    self.nodes[left].parent = Some(succ);
                    self.nodes[right].parent = Some(succ);
                    (succ_parent, Side::Left)
                };
                self.nodes[succ].balance = balance;
                self.replace_child(parent, node, Some(succ));
                Some(start)
            }
            (child, None) | (None, child) => {
                let side = parent.map(|p| self.side_of(p, node));
                self.replace_child(parent, node, child);
                parent.zip(side)
            }
        };

        if let Some((start, side)) = retrace {
            self.retrace_delete(start, side);
        }
        self.nodes.free(node).key
    }

    fn alloc(&mut self, key: K, parent: Option<NodeId<K>>) -> NodeId<K> {
        self.nodes.alloc(Node {
            key,
            left: None,
            right: None,
            parent,
            balance: 0,
        })
    }

    fn attach(&mut self, parent: NodeId<K>, side: Side, key: K) -> NodeId<K> {
        let node = self.alloc(key, Some(parent));
        self.set_child(parent, side, Some(node));
        self.retrace_insert(node);
        node
    }

    #[inline]
    fn child(&self, node: NodeId<K>, side: Side) -> Option<NodeId<K>> {
        match side {
            Side::Left => self.nodes[node].left,
            Side::Right => self.nodes[node].right,
        }
    }

    #[inline]
    fn set_child(&mut self, node: NodeId<K>, side: Side, child: Option<NodeId<K>>) {
        match side {
            Side::Left => self.nodes[node].left = child,
            Side::Right => self.nodes[node].right = child,
        }
    }

    #[inline]
    fn side_of(&self, parent: NodeId<K>, child: NodeId<K>) -> Side {
        if self.nodes[parent].left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Point whatever referenced `old` (its parent or the root) at `new`.
    fn replace_child(
        &mut self,
        parent: Option<NodeId<K>>,
        old: NodeId<K>,
        new: Option<NodeId<K>>,
    ) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let side = self.side_of(p, old);
                self.set_child(p, side, new);
            }
        }
        if let Some(n) = new {
            self.nodes[n].parent = parent;
        }
    }

    fn leftmost(&self, mut node: NodeId<K>) -> NodeId<K> {
        while let Some(left) = self.nodes[node].left {
            node = left;
        }
        node
    }

    fn rightmost(&self, mut node: NodeId<K>) -> NodeId<K> {
        while let Some(right) = self.nodes[node].right {
            node = right;
        }
        node
    }

    fn rotate_left(&mut self, x: NodeId<K>) -> NodeId<K> {
        let y = self.nodes[x].right.expect("rotate_left needs a right child");
        let parent = self.nodes[x].parent;
        let inner = self.nodes[y].left;

        self.nodes[x].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }
        self.replace_child(parent, x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);

        let xb = self.nodes[x].balance - 1 - self.nodes[y].balance.max(0);
        let yb = self.nodes[y].balance - 1 + xb.min(0);
        self.nodes[x].balance = xb;
        self.nodes[y].balance = yb;
        y
    }

    fn rotate_right(&mut self, x: NodeId<K>) -> NodeId<K> {
        let y = self.nodes[x].left.expect("rotate_right needs a left child");
        let parent = self.nodes[x].parent;
        let inner = self.nodes[y].right;

        self.nodes[x].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }
        self.replace_child(parent, x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);

        let xb = self.nodes[x].balance + 1 - self.nodes[y].balance.min(0);
        let yb = self.nodes[y].balance + 1 + xb.max(0);
        self.nodes[x].balance = xb;
        self.nodes[y].balance = yb;
        y
    }

    /// Restore balance at a node whose balance reached ±2; returns the new
    /// root of that subtree.
    fn rebalance(&mut self, node: NodeId<K>) -> NodeId<K> {
        if self.nodes[node].balance > 0 {
            let right = self.nodes[node].right.expect("right-heavy node");
            if self.nodes[right].balance < 0 {
                self.rotate_right(right);
            }
            self.rotate_left(node)
        } else {
            let left = self.nodes[node].left.expect("left-heavy node");
            if self.nodes[left].balance > 0 {
                self.rotate_left(left);
            }
            self.rotate_right(node)
        }
    }

    fn retrace_insert(&mut self, mut child: NodeId<K>) {
        while let Some(parent) = self.nodes[child].parent {
            match self.side_of(parent, child) {
                Side::Left => self.nodes[parent].balance -= 1,
                Side::Right => self.nodes[parent].balance += 1,
            }
            match self.nodes[parent].balance {
                0 => return,
                1 | -1 => child = parent,
                _ => {
                    self.rebalance(parent);
                    return;
                }
            }
        }
    }

    /// Walk up from `node`, whose `side` subtree just lost one level.
    fn retrace_delete(&mut self, mut node: NodeId<K>, mut side: Side) {
        loop {
            match side {
                Side::Left => self.nodes[node].balance += 1,
                Side::Right => self.nodes[node].balance -= 1,
            }
            let top = match self.nodes[node].balance {
                1 | -1 => return,
                0 => node,
                _ => {
                    let top = self.rebalance(node);
                    if self.nodes[top].balance != 0 {
                        return;
                    }
                    top
                }
            };
            let Some(parent) = self.nodes[top].parent else {
                return;
            };
            side = self.side_of(parent, top);
            node = parent;
        }
    }
}

impl<K> Default for Dict<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Dict`] that owns its comparator.
pub struct OrderedDict<K, C = NaturalOrder> {
    dict: Dict<K>,
    cmp: C,
}

impl<K, C: Compare<K>> OrderedDict<K, C> {
    pub fn with_comparator(cmp: C) -> Self {
        OrderedDict {
            dict: Dict::new(),
            cmp,
        }
    }

    pub fn insert(&mut self, key: K) -> (NodeId<K>, bool) {
        self.dict.insert_by(key, &self.cmp)
    }

    pub fn delete(&mut self, key: &K) -> Option<K> {
        self.dict.delete_by(key, &self.cmp)
    }

    pub fn delete_node(&mut self, node: NodeId<K>) -> K {
        self.dict.delete_node(node)
    }

    pub fn find(&self, key: &K) -> Option<NodeId<K>> {
        self.dict.find_by(key, &self.cmp)
    }

    pub fn find_next(&self, key: &K) -> Option<NodeId<K>> {
        self.dict.find_next_by(key, &self.cmp)
    }

    pub fn find_prev(&self, key: &K) -> Option<NodeId<K>> {
        self.dict.find_prev_by(key, &self.cmp)
    }

    pub fn nodes_count(&self) -> usize {
        self.dict.len()
    }

    pub fn clear(&mut self) {
        self.dict.clear();
    }
}

impl<K: Ord> OrderedDict<K, NaturalOrder> {
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K: Ord> Default for OrderedDict<K, NaturalOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> Deref for OrderedDict<K, C> {
    type Target = Dict<K>;

    fn deref(&self) -> &Dict<K> {
        &self.dict
    }
}

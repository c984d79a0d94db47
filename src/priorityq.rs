// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Event queue for the sweep.
//
// A two-phase priority queue:
//   Phase 1 (before `init`): inserts go into a key array that `init` sorts once.
//   Phase 2 (after `init`): inserts go into a binary min-heap.
// `extract_min` takes the smaller of the two fronts. Deletion is supported
// through the handle returned by `insert`.

use std::cmp::Ordering;

/// Handle to a queued key, valid until the key is extracted or deleted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventHandle {
    /// Slot in the pre-sorted key array.
    Sorted(u32),
    /// Slot in the heap's handle table.
    Heap(u32),
}

/// Binary min-heap with stable handles.
struct Heap<K> {
    /// nodes[1..=size] hold handle indices; nodes[0] is unused.
    nodes: Vec<u32>,
    /// handles[h] = (key, position in `nodes`); a `None` key marks a free handle.
    handles: Vec<(Option<K>, u32)>,
    size: usize,
    free_list: Vec<u32>,
    initialized: bool,
    leq: fn(&K, &K) -> bool,
}

impl<K: Copy> Heap<K> {
    fn new(leq: fn(&K, &K) -> bool) -> Self {
        Heap {
            nodes: vec![0],
            handles: Vec::new(),
            size: 0,
            free_list: Vec::new(),
            initialized: false,
            leq,
        }
    }

    #[inline]
    fn key_of(&self, handle: u32) -> &K {
        match &self.handles[handle as usize].0 {
            Some(key) => key,
            None => panic!("heap node refers to a free handle"),
        }
    }

    #[inline]
    fn place(&mut self, pos: usize, handle: u32) {
        self.nodes[pos] = handle;
        self.handles[handle as usize].1 = pos as u32;
    }

    fn float_down(&mut self, mut curr: usize) {
        let h_curr = self.nodes[curr];
        loop {
            let mut child = curr << 1;
            if child > self.size {
                break;
            }
            if child < self.size
                && (self.leq)(self.key_of(self.nodes[child + 1]), self.key_of(self.nodes[child]))
            {
                child += 1;
            }
            let h_child = self.nodes[child];
            if (self.leq)(self.key_of(h_curr), self.key_of(h_child)) {
                break;
            }
            self.place(curr, h_child);
            curr = child;
        }
        self.place(curr, h_curr);
    }

    fn float_up(&mut self, mut curr: usize) {
        let h_curr = self.nodes[curr];
        while curr > 1 {
            let parent = curr >> 1;
            let h_parent = self.nodes[parent];
            if (self.leq)(self.key_of(h_parent), self.key_of(h_curr)) {
                break;
            }
            self.place(curr, h_parent);
            curr = parent;
        }
        self.place(curr, h_curr);
    }

    fn init(&mut self) {
        for i in (1..=self.size).rev() {
            self.float_down(i);
        }
        self.initialized = true;
    }

    fn insert(&mut self, key: K) -> u32 {
        self.size += 1;
        let curr = self.size;
        if self.nodes.len() <= curr {
            self.nodes.push(0);
        }

        let handle = match self.free_list.pop() {
            Some(h) => {
                self.handles[h as usize] = (Some(key), curr as u32);
                h
            }
            None => {
                self.handles.push((Some(key), curr as u32));
                (self.handles.len() - 1) as u32
            }
        };
        self.nodes[curr] = handle;

        if self.initialized {
            self.float_up(curr);
        }
        handle
    }

    fn release(&mut self, handle: u32) -> K {
        let key = match self.handles[handle as usize].0.take() {
            Some(key) => key,
            None => panic!("heap handle {} released twice", handle),
        };
        self.free_list.push(handle);
        key
    }

    fn extract_min(&mut self) -> Option<K> {
        if self.size == 0 {
            return None;
        }
        let h_min = self.nodes[1];
        let last = self.nodes[self.size];
        self.place(1, last);
        self.size -= 1;
        if self.size > 0 {
            self.float_down(1);
        }
        Some(self.release(h_min))
    }

    fn delete(&mut self, h_curr: u32) {
        let curr = self.handles[h_curr as usize].1 as usize;
        debug_assert!(self.handles[h_curr as usize].0.is_some());

        let last = self.nodes[self.size];
        self.place(curr, last);
        self.size -= 1;

        if curr <= self.size {
            if curr <= 1
                || (self.leq)(self.key_of(self.nodes[curr >> 1]), self.key_of(self.nodes[curr]))
            {
                self.float_down(curr);
            } else {
                self.float_up(curr);
            }
        }
        self.release(h_curr);
    }

    #[inline]
    fn minimum(&self) -> Option<&K> {
        (self.size > 0).then(|| self.key_of(self.nodes[1]))
    }

    #[inline]
    fn len(&self) -> usize {
        self.size
    }
}

/// The combined priority queue (sorted array + heap).
pub struct PriorityQ<K> {
    heap: Heap<K>,
    /// Keys inserted before `init`; deleted entries become `None`.
    keys: Vec<Option<K>>,
    /// Indices into `keys`, sorted descending so the minimum is at the end.
    order: Vec<u32>,
    initialized: bool,
    leq: fn(&K, &K) -> bool,
}

impl<K: Copy> PriorityQ<K> {
    /// `leq(a, b)` must be a total preorder: true iff `a` sorts no later than `b`.
    pub fn new(leq: fn(&K, &K) -> bool) -> Self {
        PriorityQ {
            heap: Heap::new(leq),
            keys: Vec::new(),
            order: Vec::new(),
            initialized: false,
            leq,
        }
    }

    pub fn with_capacity(capacity: usize, leq: fn(&K, &K) -> bool) -> Self {
        let mut pq = Self::new(leq);
        pq.keys.reserve(capacity);
        pq
    }

    /// Sort the keys inserted so far. Later inserts go to the heap.
    pub fn init(&mut self) {
        let keys = &self.keys;
        let leq = self.leq;
        self.order = (0..keys.len() as u32)
            .filter(|&i| keys[i as usize].is_some())
            .collect();
        self.order.sort_by(|&a, &b| {
            let (ka, kb) = match (&keys[a as usize], &keys[b as usize]) {
                (Some(ka), Some(kb)) => (ka, kb),
                _ => unreachable!("deleted keys are filtered out"),
            };
            // Descending, so `pop` yields ascending order.
            match (leq(ka, kb), leq(kb, ka)) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => Ordering::Equal,
            }
        });
        self.initialized = true;
        self.heap.init();
    }

    pub fn insert(&mut self, key: K) -> EventHandle {
        if self.initialized {
            return EventHandle::Heap(self.heap.insert(key));
        }
        self.keys.push(Some(key));
        EventHandle::Sorted((self.keys.len() - 1) as u32)
    }

    fn sorted_min(&self) -> Option<&K> {
        let &last = self.order.last()?;
        self.keys[last as usize].as_ref()
    }

    /// Drop deleted entries from the end of the sorted array.
    fn trim_sorted(&mut self) {
        while let Some(&last) = self.order.last() {
            if self.keys[last as usize].is_some() {
                break;
            }
            self.order.pop();
        }
    }

    pub fn minimum(&self) -> Option<&K> {
        match (self.sorted_min(), self.heap.minimum()) {
            (Some(s), Some(h)) => Some(if (self.leq)(h, s) { h } else { s }),
            (s, h) => s.or(h),
        }
    }

    pub fn extract_min(&mut self) -> Option<K> {
        let take_heap = match (self.sorted_min(), self.heap.minimum()) {
            (Some(s), Some(h)) => (self.leq)(h, s),
            (None, _) => true,
            (Some(_), None) => false,
        };
        if take_heap {
            return self.heap.extract_min();
        }
        let index = self.order.pop()?;
        let key = self.keys[index as usize].take();
        self.trim_sorted();
        key
    }

    pub fn delete(&mut self, handle: EventHandle) {
        match handle {
            EventHandle::Heap(h) => self.heap.delete(h),
            EventHandle::Sorted(i) => {
                debug_assert!(self.keys[i as usize].is_some());
                self.keys[i as usize] = None;
                self.trim_sorted();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.minimum().is_none()
    }

    /// Number of keys still queued.
    pub fn len(&self) -> usize {
        let sorted = self
            .order
            .iter()
            .filter(|&&i| self.keys[i as usize].is_some())
            .count();
        sorted + self.heap.len()
    }
}

//! Search state and open list for path node searches
//!

use crate::nav_query::PolyRef;
use crate::path_node::NodeId;

/// Search flags of a visited node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchFlags(u8);

impl SearchFlags {
    pub const OPEN: SearchFlags = SearchFlags(0x01);
    pub const CLOSED: SearchFlags = SearchFlags(0x02);

    pub fn contains(&self, flag: SearchFlags) -> bool {
        self.0 & flag.0 != 0
    }

    pub fn insert(&mut self, flag: SearchFlags) {
        self.0 |= flag.0;
    }

    pub fn remove(&mut self, flag: SearchFlags) {
        self.0 &= !flag.0;
    }
}

/// Per node search state
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Total cost up to the node
    pub cost: i32,
    /// Node the search came from
    pub parent: Option<NodeId>,
    /// Index of the link in the parent's link list
    pub parent_link: Option<usize>,
    /// Polygon the node was entered through
    pub entry_poly: PolyRef,
    pub flags: SearchFlags,
}

/// Search state of every node, indexed by [`NodeId`].
#[derive(Debug, Default)]
pub struct SearchPool {
    nodes: Vec<Option<SearchNode>>,
}

impl SearchPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: vec![None; capacity],
        }
    }

    pub fn clear(&mut self) {
        self.nodes.iter_mut().for_each(|n| *n = None);
    }

    pub fn get(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(id.index()).and_then(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SearchNode> {
        self.nodes.get_mut(id.index()).and_then(|n| n.as_mut())
    }

    /// Stores the search state for `id`, growing the pool if needed.
    pub fn insert(&mut self, id: NodeId, node: SearchNode) {
        if id.index() >= self.nodes.len() {
            self.nodes.resize(id.index() + 1, None);
        }
        self.nodes[id.index()] = Some(node);
    }

    /// Number of nodes the search touched
    pub fn visited_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }
}

/// Binary heap of node ids ordered by `(cost, id)` with decrease-key.
#[derive(Debug, Default)]
pub struct OpenList {
    heap: Vec<(i32, NodeId)>,
    positions: Vec<Option<usize>>,
}

impl OpenList {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
        }
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.positions.iter_mut().for_each(|p| *p = None);
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    /// Inserts a node, or updates its cost if it is already queued
    pub fn push(&mut self, id: NodeId, cost: i32) {
        if let Some(pos) = self.position(id) {
            self.modify_at(pos, cost);
            return;
        }
        if id.index() >= self.positions.len() {
            self.positions.resize(id.index() + 1, None);
        }
        self.heap.push((cost, id));
        let last = self.heap.len() - 1;
        self.positions[id.index()] = Some(last);
        self.bubble_up(last);
    }

    /// Changes the cost of a queued node
    pub fn modify(&mut self, id: NodeId, cost: i32) {
        if let Some(pos) = self.position(id) {
            self.modify_at(pos, cost);
        }
    }

    /// Pops the cheapest node
    pub fn pop(&mut self) -> Option<(NodeId, i32)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let (cost, id) = self.heap.pop()?;
        self.positions[id.index()] = None;
        if !self.heap.is_empty() {
            self.trickle_down(0);
        }
        Some((id, cost))
    }

    fn position(&self, id: NodeId) -> Option<usize> {
        self.positions.get(id.index()).copied().flatten()
    }

    fn modify_at(&mut self, pos: usize, cost: i32) {
        let old = self.heap[pos].0;
        self.heap[pos].0 = cost;
        if cost < old {
            self.bubble_up(pos);
        } else {
            self.trickle_down(pos);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a].1.index()] = Some(a);
        self.positions[self.heap[b].1.index()] = Some(b);
    }

    /// Bubbles an entry up the heap
    fn bubble_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.heap[i] >= self.heap[parent] {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    /// Trickles an entry down the heap
    fn trickle_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;
            if left < len && self.heap[left] < self.heap[smallest] {
                smallest = left;
            }
            if right < len && self.heap[right] < self.heap[smallest] {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.swap(i, smallest);
            i = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_list_orders_by_cost_then_id() {
        let mut open = OpenList::new(4);
        open.push(NodeId::new(3), 50);
        open.push(NodeId::new(1), 20);
        open.push(NodeId::new(2), 20);
        open.push(NodeId::new(0), 70);

        assert_eq!(open.pop(), Some((NodeId::new(1), 20)));
        assert_eq!(open.pop(), Some((NodeId::new(2), 20)));
        assert_eq!(open.pop(), Some((NodeId::new(3), 50)));
        assert_eq!(open.pop(), Some((NodeId::new(0), 70)));
        assert!(open.pop().is_none());
    }

    #[test]
    fn test_open_list_decrease_key() {
        let mut open = OpenList::new(2);
        open.push(NodeId::new(0), 100);
        open.push(NodeId::new(1), 50);
        open.push(NodeId::new(5), 75);
        open.modify(NodeId::new(0), 10);
        assert!(open.contains(NodeId::new(5)));
        assert_eq!(open.len(), 3);
        assert_eq!(open.pop(), Some((NodeId::new(0), 10)));
        assert!(!open.contains(NodeId::new(0)));
        // Pushing a queued node updates it in place
        open.push(NodeId::new(5), 5);
        assert_eq!(open.len(), 2);
        assert_eq!(open.pop(), Some((NodeId::new(5), 5)));
    }

    #[test]
    fn test_search_flags() {
        let mut flags = SearchFlags::default();
        flags.insert(SearchFlags::OPEN);
        assert!(flags.contains(SearchFlags::OPEN));
        flags.remove(SearchFlags::OPEN);
        flags.insert(SearchFlags::CLOSED);
        assert!(!flags.contains(SearchFlags::OPEN));
        assert!(flags.contains(SearchFlags::CLOSED));
    }
}

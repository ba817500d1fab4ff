//! MRU ring (Z-order)
//!
//! A circular doubly-linked list with one node per live slot. Nodes live in
//! an arena addressed by slot index, so node `i` always stands for slot `i`
//! and removing a slot is a splice followed by a renumbering pass over the
//! arena.
//!
//! Switching buffers promotes the target to the front of the ring. A cycling
//! session (holding a modifier while stepping through buffers) only moves the
//! `top` cursor; the promotion happens once, when the session ends, relative
//! to where the session started.

/// Neighbour links of one ring node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    prev: usize,
    next: usize,
}

/// Cycling state of the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    /// Every switch promotes immediately
    #[default]
    Idle,
    /// A cycling session is open; `anchor` was the top when it began
    Cycling { anchor: usize },
}

/// Most-recently-used ring over slot indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MruRing {
    links: Vec<Link>,
    top: usize,
    bottom: usize,
    state: CycleState,
}

impl MruRing {
    /// Ring holding the single node 0
    pub fn new() -> Self {
        Self {
            links: vec![Link { prev: 0, next: 0 }],
            top: 0,
            bottom: 0,
            state: CycleState::Idle,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Front of the MRU order (the cycling cursor while a session is open)
    pub fn top(&self) -> usize {
        self.top
    }

    /// Least recently used node
    pub fn bottom(&self) -> usize {
        self.bottom
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn is_cycling(&self) -> bool {
        matches!(self.state, CycleState::Cycling { .. })
    }

    /// Structural front: the node following `bottom`
    fn head(&self) -> usize {
        match self.state {
            CycleState::Idle => self.top,
            CycleState::Cycling { anchor } => anchor,
        }
    }

    /// Node after the top in MRU order
    pub fn next_in_order(&self) -> usize {
        self.links[self.top].next
    }

    /// Node before the top in MRU order
    pub fn prev_in_order(&self) -> usize {
        self.links[self.top].prev
    }

    /// Slot indices from most to least recently used
    pub fn order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.links.len());
        let mut node = self.head();
        for _ in 0..self.links.len() {
            order.push(node);
            node = self.links[node].next;
        }
        order
    }

    /// Appends a node for the next slot index at the MRU bottom
    pub fn push_bottom(&mut self) -> usize {
        let index = self.links.len();
        let head = self.head();
        let bottom = self.bottom;
        self.links.push(Link {
            prev: bottom,
            next: head,
        });
        self.links[bottom].next = index;
        self.links[head].prev = index;
        self.bottom = index;
        index
    }

    /// Removes the node for `index` and renumbers every node above it
    ///
    /// An open cycling session is committed first. The sole node of a
    /// one-node ring is never removed.
    pub fn remove(&mut self, index: usize) {
        debug_assert!(index < self.links.len(), "ring index {} out of range", index);
        if self.links.len() <= 1 || index >= self.links.len() {
            return;
        }
        self.end_cycling();

        let Link { prev, next } = self.links[index];
        self.links[next].prev = prev;
        self.links[prev].next = next;
        if self.top == index {
            self.top = next;
        }
        if self.bottom == index {
            self.bottom = prev;
        }

        self.links.remove(index);
        let shift = |i: usize| if i > index { i - 1 } else { i };
        for link in &mut self.links {
            link.prev = shift(link.prev);
            link.next = shift(link.next);
        }
        self.top = shift(self.top);
        self.bottom = shift(self.bottom);
    }

    /// Makes `index` the top
    ///
    /// Idle: promotes immediately. Cycling: only moves the cursor.
    pub fn set_current(&mut self, index: usize) {
        debug_assert!(index < self.links.len(), "ring index {} out of range", index);
        match self.state {
            CycleState::Cycling { .. } => self.top = index,
            CycleState::Idle => {
                let anchor = self.top;
                self.top = index;
                self.bottom = commit_splice(&mut self.links, self.bottom, anchor, index);
            }
        }
    }

    /// Opens a cycling session; no-op when one is already open
    pub fn begin_cycling(&mut self) {
        if let CycleState::Idle = self.state {
            self.state = CycleState::Cycling { anchor: self.top };
        }
    }

    /// Promotes the node the session ended on and returns to idle
    pub fn end_cycling(&mut self) {
        if let CycleState::Cycling { anchor } = self.state {
            self.bottom = commit_splice(&mut self.links, self.bottom, anchor, self.top);
            self.state = CycleState::Idle;
        }
    }

    /// Checks the ring shape
    ///
    /// Following `next` from the front visits every node exactly once and
    /// returns to the front, every `prev` mirrors a `next`, and the bottom is
    /// the node before the front.
    pub fn is_consistent(&self) -> bool {
        let len = self.links.len();
        if len == 0 || self.top >= len || self.bottom >= len {
            return false;
        }
        let head = self.head();
        if head >= len || self.links[head].prev != self.bottom {
            return false;
        }
        let mut seen = vec![false; len];
        let mut node = head;
        for _ in 0..len {
            if seen[node] {
                return false;
            }
            seen[node] = true;
            let next = self.links[node].next;
            if next >= len || self.links[next].prev != node {
                return false;
            }
            node = next;
        }
        node == head && seen.iter().all(|&s| s)
    }
}

impl Default for MruRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves `new_top` in front of `anchor` and returns the new bottom
///
/// `anchor` is the node that was on top when the switch (or cycling session)
/// started, so the relative order of every other node is kept.
fn commit_splice(links: &mut [Link], bottom: usize, anchor: usize, new_top: usize) -> usize {
    if new_top == anchor {
        return bottom;
    }

    if new_top == bottom {
        // Rotate: the ring shape is unchanged, only the ends move.
        let bottom = links[new_top].prev;
        links[bottom].next = new_top;
        links[anchor].prev = new_top;
        links[new_top].next = anchor;
        links[new_top].prev = bottom;
        return bottom;
    }

    if links.len() > 2 {
        let Link { prev, next } = links[new_top];
        links[next].prev = prev;
        links[prev].next = next;

        links[new_top].next = anchor;
        links[new_top].prev = bottom;
        links[anchor].prev = new_top;
        links[bottom].next = new_top;
    }
    bottom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_of(len: usize) -> MruRing {
        let mut ring = MruRing::new();
        for _ in 1..len {
            ring.push_bottom();
        }
        ring
    }

    #[test]
    fn test_new_ring_single_node() {
        let ring = MruRing::new();
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.top(), 0);
        assert_eq!(ring.next_in_order(), 0);
        assert_eq!(ring.prev_in_order(), 0);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_push_bottom_appends_least_recent() {
        let ring = ring_of(4);
        assert_eq!(ring.order(), vec![0, 1, 2, 3]);
        assert_eq!(ring.bottom(), 3);
        assert_eq!(ring.prev_in_order(), 3);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_set_current_interior_promotes() {
        let mut ring = ring_of(4);
        ring.set_current(2);
        assert_eq!(ring.order(), vec![2, 0, 1, 3]);
        assert_eq!(ring.top(), 2);
        assert_eq!(ring.bottom(), 3);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_set_current_bottom_rotates() {
        let mut ring = ring_of(3);
        ring.set_current(2);
        assert_eq!(ring.order(), vec![2, 0, 1]);
        assert_eq!(ring.bottom(), 1);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_set_current_two_nodes() {
        let mut ring = ring_of(2);
        ring.set_current(1);
        assert_eq!(ring.order(), vec![1, 0]);
        ring.set_current(0);
        assert_eq!(ring.order(), vec![0, 1]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_set_current_top_is_noop() {
        let mut ring = ring_of(3);
        let before = ring.clone();
        ring.set_current(0);
        assert_eq!(ring, before);
    }

    #[test]
    fn test_cycling_defers_promotion() {
        let mut ring = ring_of(4);
        ring.begin_cycling();
        ring.set_current(ring.next_in_order());
        assert_eq!(ring.top(), 1);
        ring.set_current(ring.next_in_order());
        assert_eq!(ring.top(), 2);
        // Links untouched while cycling
        assert_eq!(ring.order(), vec![0, 1, 2, 3]);

        ring.end_cycling();
        assert_eq!(ring.state(), CycleState::Idle);
        assert_eq!(ring.order(), vec![2, 0, 1, 3]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_cycling_back_to_anchor_changes_nothing() {
        let mut ring = ring_of(3);
        let before = ring.order();
        ring.begin_cycling();
        ring.set_current(1);
        ring.set_current(2);
        ring.set_current(0);
        ring.end_cycling();
        assert_eq!(ring.order(), before);
    }

    #[test]
    fn test_begin_cycling_twice_keeps_anchor() {
        let mut ring = ring_of(3);
        ring.begin_cycling();
        ring.set_current(1);
        ring.begin_cycling();
        assert_eq!(ring.state(), CycleState::Cycling { anchor: 0 });
    }

    #[test]
    fn test_push_while_cycling_links_behind_anchor() {
        let mut ring = ring_of(3);
        ring.begin_cycling();
        ring.set_current(1);
        ring.push_bottom();
        ring.end_cycling();
        assert_eq!(ring.order(), vec![1, 0, 2, 3]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_remove_top_renumbers() {
        let mut ring = ring_of(4);
        ring.set_current(1);
        // order: 1 0 2 3
        ring.remove(1);
        // old 2 -> 1, old 3 -> 2
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.top(), 0);
        assert_eq!(ring.order(), vec![0, 1, 2]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_remove_bottom() {
        let mut ring = ring_of(3);
        ring.remove(2);
        assert_eq!(ring.order(), vec![0, 1]);
        assert_eq!(ring.bottom(), 1);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_remove_commits_cycling_first() {
        let mut ring = ring_of(3);
        ring.begin_cycling();
        ring.set_current(2);
        ring.remove(2);
        assert!(!ring.is_cycling());
        assert_eq!(ring.order(), vec![0, 1]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn test_remove_last_node_is_refused() {
        let mut ring = MruRing::new();
        ring.remove(0);
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_prev_and_next_are_inverse() {
        let mut ring = ring_of(5);
        ring.set_current(3);
        ring.set_current(1);
        for _ in 0..ring.len() {
            let top = ring.top();
            let next = ring.next_in_order();
            ring.begin_cycling();
            ring.set_current(next);
            assert_eq!(ring.prev_in_order(), top);
            ring.set_current(top);
            ring.end_cycling();
            ring.set_current(next);
        }
    }
}

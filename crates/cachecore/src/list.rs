//! Intrusive doubly-linked list over a node arena
//!
//! Nodes live in a [`NodeArena`] slab and are linked by [`NodeId`] handles
//! instead of pointers. A list is a sentinel slot in the same arena plus a
//! length, and the chain through `prev`/`next` is always closed: an empty
//! list is a sentinel pointing at itself both ways.
//!
//! Several lists can share one arena (the LFU cache keeps one list per
//! frequency). Link fields are private to this module, so list order can only
//! change through [`IntrusiveList`] operations.

use crate::error::{Error, Result};

/// Stable handle to a node slot in a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Slot in the arena
///
/// Sentinels have no payload and own themselves. Detached nodes have a
/// payload and no owner. Free slots have neither.
struct Slot<T> {
    payload: Option<T>,
    prev: usize,
    next: usize,
    /// Sentinel index of the list this slot is linked into
    owner: Option<usize>,
}

/// Slab of list nodes addressed by [`NodeId`]
pub struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    live: usize,
}

impl<T> NodeArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty arena with room for `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Allocate a detached node holding `payload`
    pub fn insert(&mut self, payload: T) -> NodeId {
        self.live += 1;
        NodeId(self.alloc(Some(payload)))
    }

    /// Free a detached node and hand back its payload
    ///
    /// Fails with [`Error::NodeStillLinked`] if the node is still in a list and
    /// with [`Error::NodeNotInList`] if the handle is not a live node.
    pub fn release(&mut self, id: NodeId) -> Result<T> {
        let slot = self.slots.get_mut(id.0).ok_or(Error::NodeNotInList)?;
        if slot.owner.is_some() {
            return Err(Error::NodeStillLinked);
        }
        let payload = slot.payload.take().ok_or(Error::NodeNotInList)?;
        self.free_list.push(id.0);
        self.live -= 1;
        Ok(payload)
    }

    /// Payload of a live node
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.0).and_then(|slot| slot.payload.as_ref())
    }

    /// Mutable payload of a live node
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(|slot| slot.payload.as_mut())
    }

    /// Number of payload-bearing nodes, linked or not
    pub fn len(&self) -> usize {
        self.live
    }

    /// True if no payload-bearing node is allocated
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slots currently holding a node or a sentinel
    #[cfg(test)]
    pub(crate) fn slots_in_use(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Drop every slot, sentinels included
    ///
    /// Lists built on this arena are invalid afterwards and must be recreated.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.live = 0;
    }

    fn alloc(&mut self, payload: Option<T>) -> usize {
        let slot = Slot {
            payload,
            prev: 0,
            next: 0,
            owner: None,
        };
        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.slots[idx].prev = idx;
        self.slots[idx].next = idx;
        idx
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sentinel-anchored circular list of arena nodes
///
/// Traversal from the sentinel forward yields insertion order: the head is the
/// oldest node still present, the tail the most recently appended.
#[derive(Debug)]
pub struct IntrusiveList {
    sentinel: usize,
    len: usize,
}

impl IntrusiveList {
    /// Create an empty list whose sentinel lives in `arena`
    pub fn new<T>(arena: &mut NodeArena<T>) -> Self {
        let sentinel = arena.alloc(None);
        arena.slots[sentinel].owner = Some(sentinel);
        Self { sentinel, len: 0 }
    }

    /// Number of nodes in the list
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the list holds no nodes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Link a detached node in as the new tail. O(1).
    pub fn append<T>(&mut self, arena: &mut NodeArena<T>, id: NodeId) -> Result<()> {
        match arena.slots.get(id.0) {
            Some(slot) if slot.owner.is_some() => return Err(Error::NodeStillLinked),
            Some(slot) if slot.payload.is_some() => {}
            _ => return Err(Error::NodeNotInList),
        }

        let tail = arena.slots[self.sentinel].prev;
        let node = &mut arena.slots[id.0];
        node.prev = tail;
        node.next = self.sentinel;
        node.owner = Some(self.sentinel);
        arena.slots[tail].next = id.0;
        arena.slots[self.sentinel].prev = id.0;
        self.len += 1;
        Ok(())
    }

    /// Unlink a node that belongs to this list. O(1).
    ///
    /// The node stays allocated in the arena and can be appended again or
    /// released.
    pub fn remove_node<T>(&mut self, arena: &mut NodeArena<T>, id: NodeId) -> Result<NodeId> {
        if self.len == 0 {
            return Err(Error::EmptyList);
        }
        match arena.slots.get(id.0) {
            Some(slot) if id.0 != self.sentinel && slot.owner == Some(self.sentinel) => {}
            _ => return Err(Error::NodeNotInList),
        }

        let (prev, next) = {
            let node = &arena.slots[id.0];
            (node.prev, node.next)
        };
        arena.slots[prev].next = next;
        arena.slots[next].prev = prev;

        let node = &mut arena.slots[id.0];
        node.prev = id.0;
        node.next = id.0;
        node.owner = None;
        self.len -= 1;
        Ok(id)
    }

    /// Unlink the oldest node. O(1).
    pub fn remove_head<T>(&mut self, arena: &mut NodeArena<T>) -> Result<NodeId> {
        let head = self.head(arena).ok_or(Error::EmptyList)?;
        self.remove_node(arena, head)
    }

    /// Oldest node, without unlinking it
    pub fn head<T>(&self, arena: &NodeArena<T>) -> Option<NodeId> {
        if self.is_empty() {
            None
        } else {
            Some(NodeId(arena.slots[self.sentinel].next))
        }
    }

    /// Most recently appended node, without unlinking it
    pub fn tail<T>(&self, arena: &NodeArena<T>) -> Option<NodeId> {
        if self.is_empty() {
            None
        } else {
            Some(NodeId(arena.slots[self.sentinel].prev))
        }
    }

    /// Iterate payloads from head (oldest) to tail (newest)
    pub fn iter<'a, T>(&self, arena: &'a NodeArena<T>) -> Iter<'a, T> {
        Iter {
            arena,
            cursor: arena.slots[self.sentinel].next,
            remaining: self.len,
        }
    }

    /// Free the sentinel of an empty list
    ///
    /// Fails with [`Error::NodeStillLinked`] if nodes are still linked; the
    /// sentinel then stays allocated so those nodes never join another list.
    pub fn release<T>(self, arena: &mut NodeArena<T>) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::NodeStillLinked);
        }
        let sentinel = &mut arena.slots[self.sentinel];
        sentinel.owner = None;
        sentinel.prev = self.sentinel;
        sentinel.next = self.sentinel;
        arena.free_list.push(self.sentinel);
        Ok(())
    }
}

/// Iterator over a list's nodes, oldest first
pub struct Iter<'a, T> {
    arena: &'a NodeArena<T>,
    cursor: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.cursor;
        let slot = &self.arena.slots[idx];
        self.cursor = slot.next;
        self.remaining -= 1;
        slot.payload.as_ref().map(|payload| (NodeId(idx), payload))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk the ring both ways and check it closes on the sentinel after
    /// exactly `len` nodes.
    fn assert_ring<T>(list: &IntrusiveList, arena: &NodeArena<T>) {
        let mut forward = 0;
        let mut idx = arena.slots[list.sentinel].next;
        while idx != list.sentinel {
            assert_eq!(arena.slots[arena.slots[idx].next].prev, idx);
            assert_eq!(arena.slots[idx].owner, Some(list.sentinel));
            forward += 1;
            idx = arena.slots[idx].next;
            assert!(forward <= list.len(), "ring does not close");
        }
        let mut backward = 0;
        let mut idx = arena.slots[list.sentinel].prev;
        while idx != list.sentinel {
            backward += 1;
            idx = arena.slots[idx].prev;
            assert!(backward <= list.len(), "ring does not close");
        }
        assert_eq!(forward, list.len());
        assert_eq!(backward, list.len());
    }

    fn values<T: Copy>(list: &IntrusiveList, arena: &NodeArena<T>) -> Vec<T> {
        list.iter(arena).map(|(_, v)| *v).collect()
    }

    #[test]
    fn test_empty_list_is_closed() {
        let mut arena: NodeArena<u32> = NodeArena::new();
        let list = IntrusiveList::new(&mut arena);

        assert!(list.is_empty());
        assert_eq!(arena.slots[list.sentinel].next, list.sentinel);
        assert_eq!(arena.slots[list.sentinel].prev, list.sentinel);
        assert_ring(&list, &arena);
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut arena = NodeArena::new();
        let mut list = IntrusiveList::new(&mut arena);

        for v in 1..=4 {
            let id = arena.insert(v);
            list.append(&mut arena, id).unwrap();
        }

        assert_eq!(list.len(), 4);
        assert_eq!(values(&list, &arena), vec![1, 2, 3, 4]);
        assert_eq!(arena.get(list.head(&arena).unwrap()), Some(&1));
        assert_eq!(arena.get(list.tail(&arena).unwrap()), Some(&4));
        assert_ring(&list, &arena);
    }

    #[test]
    fn test_remove_node_from_middle() {
        let mut arena = NodeArena::new();
        let mut list = IntrusiveList::new(&mut arena);
        let ids: Vec<_> = (1..=3).map(|v| arena.insert(v)).collect();
        for &id in &ids {
            list.append(&mut arena, id).unwrap();
        }

        let removed = list.remove_node(&mut arena, ids[1]).unwrap();

        assert_eq!(removed, ids[1]);
        assert_eq!(values(&list, &arena), vec![1, 3]);
        assert_ring(&list, &arena);

        // Re-appending moves it to the tail
        list.append(&mut arena, removed).unwrap();
        assert_eq!(values(&list, &arena), vec![1, 3, 2]);
        assert_ring(&list, &arena);
    }

    #[test]
    fn test_remove_head() {
        let mut arena = NodeArena::new();
        let mut list = IntrusiveList::new(&mut arena);
        for v in [5, 6] {
            let id = arena.insert(v);
            list.append(&mut arena, id).unwrap();
        }

        let first = list.remove_head(&mut arena).unwrap();
        let second = list.remove_head(&mut arena).unwrap();

        assert_eq!(arena.release(first), Ok(5));
        assert_eq!(arena.release(second), Ok(6));
        assert!(list.is_empty());
        assert_ring(&list, &arena);
    }

    #[test]
    fn test_remove_head_on_empty() {
        let mut arena: NodeArena<u32> = NodeArena::new();
        let mut list = IntrusiveList::new(&mut arena);

        assert_eq!(list.remove_head(&mut arena), Err(Error::EmptyList));
    }

    #[test]
    fn test_remove_node_from_other_list() {
        let mut arena = NodeArena::new();
        let mut a = IntrusiveList::new(&mut arena);
        let mut b = IntrusiveList::new(&mut arena);
        let in_a = arena.insert(1);
        let in_b = arena.insert(2);
        a.append(&mut arena, in_a).unwrap();
        b.append(&mut arena, in_b).unwrap();

        assert_eq!(a.remove_node(&mut arena, in_b), Err(Error::NodeNotInList));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_ring(&a, &arena);
        assert_ring(&b, &arena);
    }

    #[test]
    fn test_append_linked_node_rejected() {
        let mut arena = NodeArena::new();
        let mut list = IntrusiveList::new(&mut arena);
        let id = arena.insert(1);
        list.append(&mut arena, id).unwrap();

        assert_eq!(list.append(&mut arena, id), Err(Error::NodeStillLinked));
        assert_eq!(arena.release(id), Err(Error::NodeStillLinked));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_release_reuses_slots() {
        let mut arena = NodeArena::new();
        let mut list = IntrusiveList::new(&mut arena);
        let id = arena.insert(1);
        list.append(&mut arena, id).unwrap();
        list.remove_node(&mut arena, id).unwrap();
        arena.release(id).unwrap();

        assert!(arena.is_empty());
        assert_eq!(arena.get(id), None);
        assert_eq!(arena.release(id), Err(Error::NodeNotInList));

        let reused = arena.insert(7);
        assert_eq!(reused, id);
        assert_eq!(arena.slots.len(), 2);
    }

    #[test]
    fn test_release_empty_list_frees_sentinel() {
        let mut arena: NodeArena<u32> = NodeArena::new();
        let list = IntrusiveList::new(&mut arena);
        list.release(&mut arena).unwrap();

        let again = IntrusiveList::new(&mut arena);
        assert_eq!(arena.slots.len(), 1);
        assert_ring(&again, &arena);
    }

    #[test]
    fn test_release_non_empty_list_rejected() {
        let mut arena = NodeArena::new();
        let mut list = IntrusiveList::new(&mut arena);
        let id = arena.insert(1);
        list.append(&mut arena, id).unwrap();
        let sentinel = list.sentinel;

        assert_eq!(list.release(&mut arena), Err(Error::NodeStillLinked));

        // The sentinel is not handed out again, so the node cannot end up
        // counted as part of a fresh list
        let other = IntrusiveList::new(&mut arena);
        assert_ne!(other.sentinel, sentinel);
        assert_eq!(arena.slots[id.0].owner, Some(sentinel));
        assert_eq!(arena.get(id), Some(&1));
        assert_ring(&other, &arena);
    }

    #[test]
    fn test_lists_share_arena() {
        let mut arena = NodeArena::new();
        let mut low = IntrusiveList::new(&mut arena);
        let mut high = IntrusiveList::new(&mut arena);
        let ids: Vec<_> = (0..6).map(|v| arena.insert(v)).collect();
        for &id in &ids {
            low.append(&mut arena, id).unwrap();
        }

        // Move the even values across, one at a time
        for &id in ids.iter().step_by(2) {
            low.remove_node(&mut arena, id).unwrap();
            high.append(&mut arena, id).unwrap();
        }

        assert_eq!(values(&low, &arena), vec![1, 3, 5]);
        assert_eq!(values(&high, &arena), vec![0, 2, 4]);
        assert_eq!(arena.len(), 6);
        assert_ring(&low, &arena);
        assert_ring(&high, &arena);
    }
}

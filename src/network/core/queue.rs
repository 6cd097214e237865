//! Sentinel-bounded packet lists stored in a shared arena.
//!
//! Every packet in flight lives in one [`PacketArena`] slot. A
//! [`PacketQueue`] is a doubly-linked list threaded through those slots and
//! bounded by two sentinel slots of its own, so moving a packet (or a whole
//! run of packets) between the shared chain and a module's holding queue is
//! a handful of index writes and never touches the payload.
//!
//! Ownership is tracked in the types: unlinking a node yields a
//! [`DetachedNode`] token, and only a token can be linked elsewhere or
//! destroyed. A linked node cannot be destroyed and a destroyed node
//! cannot be relinked.

use crate::network::core::packet_data::PacketData;

/// Index of a linked node inside a [`PacketArena`].
///
/// Ids are only valid while the node stays linked; traversals that mutate
/// the list must read `prev`/`next` before popping the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Exclusive handle to a packet node that is not linked into any queue.
#[must_use = "a detached node must be linked into a queue or destroyed"]
#[derive(Debug, PartialEq, Eq)]
pub struct DetachedNode(NodeId);

impl DetachedNode {
    pub fn id(&self) -> NodeId {
        self.0
    }
}

#[derive(Debug)]
struct Node {
    /// `None` marks a sentinel
    packet: Option<PacketData>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug)]
enum Entry {
    Free { next_free: Option<usize> },
    Occupied(Node),
}

/// Slab of packet nodes shared by the pipeline chain and every holding queue.
#[derive(Debug, Default)]
pub struct PacketArena {
    entries: Vec<Entry>,
    free_head: Option<usize>,
    packets: usize,
}

impl PacketArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_head: None,
            packets: 0,
        }
    }

    /// Number of packet nodes currently alive, linked or detached.
    pub fn packet_count(&self) -> usize {
        self.packets
    }

    /// Takes ownership of a freshly captured packet.
    pub fn insert(&mut self, packet: PacketData) -> DetachedNode {
        self.packets += 1;
        DetachedNode(self.alloc(Some(packet)))
    }

    /// Releases a detached node and hands its packet back to the caller.
    pub fn destroy(&mut self, node: DetachedNode) -> PacketData {
        let index = node.0 .0;
        let entry = std::mem::replace(
            &mut self.entries[index],
            Entry::Free {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(index);
        match entry {
            Entry::Occupied(Node {
                packet: Some(packet),
                prev: None,
                next: None,
            }) => {
                self.packets -= 1;
                packet
            }
            other => unreachable!("destroyed node {} was not a detached packet: {:?}", index, other),
        }
    }

    /// Payload and metadata of a packet node.
    pub fn packet(&self, id: NodeId) -> &PacketData {
        match &self.node(id).packet {
            Some(packet) => packet,
            None => unreachable!("node {} is a sentinel", id.0),
        }
    }

    pub fn packet_mut(&mut self, id: NodeId) -> &mut PacketData {
        match &mut self.node_mut(id).packet {
            Some(packet) => packet,
            None => unreachable!("node {} is a sentinel", id.0),
        }
    }

    /// Successor of a linked node.
    pub fn next(&self, id: NodeId) -> NodeId {
        self.link(self.node(id).next, id)
    }

    /// Predecessor of a linked node.
    pub fn prev(&self, id: NodeId) -> NodeId {
        self.link(self.node(id).prev, id)
    }

    /// Unlinks `id` from whatever list holds it.
    ///
    /// The owning queue's size is not touched here; use [`PacketQueue::pop`]
    /// to keep the bookkeeping.
    pub(crate) fn pop(&mut self, id: NodeId) -> DetachedNode {
        let node = self.node_mut(id);
        debug_assert!(node.packet.is_some(), "sentinels cannot be popped");
        let prev = node.prev.take();
        let next = node.next.take();
        let (prev, next) = match (prev, next) {
            (Some(prev), Some(next)) => (prev, next),
            _ => unreachable!("node {} is not linked", id.0),
        };
        self.node_mut(prev).next = Some(next);
        self.node_mut(next).prev = Some(prev);
        DetachedNode(id)
    }

    /// Links a detached node immediately after `anchor`.
    pub(crate) fn splice_after(&mut self, node: DetachedNode, anchor: NodeId) -> NodeId {
        let id = node.0;
        let after = self.next(anchor);
        {
            let inserted = self.node_mut(id);
            inserted.prev = Some(anchor);
            inserted.next = Some(after);
        }
        self.node_mut(anchor).next = Some(id);
        self.node_mut(after).prev = Some(id);
        id
    }

    fn alloc(&mut self, packet: Option<PacketData>) -> NodeId {
        let node = Node {
            packet,
            prev: None,
            next: None,
        };
        match self.free_head {
            Some(index) => {
                self.free_head = match self.entries[index] {
                    Entry::Free { next_free } => next_free,
                    Entry::Occupied(_) => unreachable!("free list points at live slot {}", index),
                };
                self.entries[index] = Entry::Occupied(node);
                NodeId(index)
            }
            None => {
                self.entries.push(Entry::Occupied(node));
                NodeId(self.entries.len() - 1)
            }
        }
    }

    fn free_sentinel(&mut self, id: NodeId) {
        debug_assert!(self.node(id).packet.is_none());
        self.entries[id.0] = Entry::Free {
            next_free: self.free_head,
        };
        self.free_head = Some(id.0);
    }

    fn node(&self, id: NodeId) -> &Node {
        match &self.entries[id.0] {
            Entry::Occupied(node) => node,
            Entry::Free { .. } => unreachable!("stale node id {}", id.0),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match &mut self.entries[id.0] {
            Entry::Occupied(node) => node,
            Entry::Free { .. } => unreachable!("stale node id {}", id.0),
        }
    }

    fn link(&self, link: Option<NodeId>, from: NodeId) -> NodeId {
        match link {
            Some(id) => id,
            None => unreachable!("node {} has no link in that direction", from.0),
        }
    }
}

/// A doubly-linked packet list bounded by its own head and tail sentinels.
///
/// `len()` always equals the number of packet nodes between the sentinels.
#[derive(Debug)]
pub struct PacketQueue {
    head: NodeId,
    tail: NodeId,
    size: usize,
}

impl PacketQueue {
    /// Allocates the two sentinels and links them to each other.
    pub fn new(arena: &mut PacketArena) -> Self {
        let head = arena.alloc(None);
        let tail = arena.alloc(None);
        arena.node_mut(head).next = Some(tail);
        arena.node_mut(tail).prev = Some(head);
        PacketQueue {
            head,
            tail,
            size: 0,
        }
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn tail(&self) -> NodeId {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Oldest end of the queue, right after the head sentinel.
    pub fn first(&self, arena: &PacketArena) -> Option<NodeId> {
        let id = arena.next(self.head);
        (id != self.tail).then_some(id)
    }

    /// Newest end of the queue, right before the tail sentinel.
    pub fn last(&self, arena: &PacketArena) -> Option<NodeId> {
        let id = arena.prev(self.tail);
        (id != self.head).then_some(id)
    }

    /// Appends before the tail sentinel.
    pub fn push_back(&mut self, arena: &mut PacketArena, node: DetachedNode) -> NodeId {
        let anchor = arena.prev(self.tail);
        self.insert_after(arena, node, anchor)
    }

    /// Prepends right after the head sentinel.
    pub fn push_front(&mut self, arena: &mut PacketArena, node: DetachedNode) -> NodeId {
        self.insert_after(arena, node, self.head)
    }

    /// Links `node` after `anchor`, which must be the head sentinel or a node of this queue.
    pub fn insert_after(
        &mut self,
        arena: &mut PacketArena,
        node: DetachedNode,
        anchor: NodeId,
    ) -> NodeId {
        debug_assert!(anchor != self.tail, "cannot insert after the tail sentinel");
        self.size += 1;
        arena.splice_after(node, anchor)
    }

    /// Unlinks a node of this queue, handing back exclusive ownership.
    pub fn pop(&mut self, arena: &mut PacketArena, id: NodeId) -> DetachedNode {
        debug_assert!(id != self.head && id != self.tail);
        debug_assert!(self.size > 0, "pop from an empty queue");
        self.size -= 1;
        arena.pop(id)
    }

    pub fn pop_front(&mut self, arena: &mut PacketArena) -> Option<DetachedNode> {
        let id = self.first(arena)?;
        Some(self.pop(arena, id))
    }

    pub fn pop_back(&mut self, arena: &mut PacketArena) -> Option<DetachedNode> {
        let id = self.last(arena)?;
        Some(self.pop(arena, id))
    }

    /// Moves every node of this queue, in order, into `dest` immediately
    /// before `boundary` and leaves this queue empty.
    ///
    /// `boundary` must be a node of `dest` other than its head sentinel
    /// (usually `dest.tail()`). Returns the number of packets moved.
    pub fn detach_before(
        &mut self,
        arena: &mut PacketArena,
        dest: &mut PacketQueue,
        boundary: NodeId,
    ) -> usize {
        if self.size == 0 {
            return 0;
        }
        debug_assert!(boundary != dest.head, "boundary cannot be a head sentinel");

        let before = arena.prev(boundary);
        let first = arena.next(self.head);
        let last = arena.prev(self.tail);

        arena.node_mut(before).next = Some(first);
        arena.node_mut(first).prev = Some(before);
        arena.node_mut(last).next = Some(boundary);
        arena.node_mut(boundary).prev = Some(last);

        arena.node_mut(self.head).next = Some(self.tail);
        arena.node_mut(self.tail).prev = Some(self.head);

        let moved = self.size;
        dest.size += moved;
        self.size = 0;
        moved
    }

    /// Destroys every packet in the queue, head first, returning them.
    pub fn drain(&mut self, arena: &mut PacketArena) -> Vec<PacketData> {
        let mut packets = Vec::with_capacity(self.size);
        while let Some(node) = self.pop_front(arena) {
            packets.push(arena.destroy(node));
        }
        packets
    }

    /// Tears the queue down, freeing its sentinels.
    ///
    /// Any packets still linked are destroyed and returned so nothing is lost silently.
    pub fn dispose(mut self, arena: &mut PacketArena) -> Vec<PacketData> {
        let leftover = self.drain(arena);
        arena.free_sentinel(self.head);
        arena.free_sentinel(self.tail);
        leftover
    }

    /// Walks head to tail yielding every packet node.
    pub fn iter<'a>(&self, arena: &'a PacketArena) -> Iter<'a> {
        Iter {
            arena,
            cursor: arena.next(self.head),
            tail: self.tail,
        }
    }

    /// Counts the nodes actually linked between the sentinels.
    pub fn count_linked(&self, arena: &PacketArena) -> usize {
        self.iter(arena).count()
    }
}

/// Iterator over the packet nodes of a [`PacketQueue`], head to tail.
pub struct Iter<'a> {
    arena: &'a PacketArena,
    cursor: NodeId,
    tail: NodeId,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NodeId, &'a PacketData);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.tail {
            return None;
        }
        let id = self.cursor;
        self.cursor = self.arena.next(id);
        Some((id, self.arena.packet(id)))
    }
}

//! Soft sound registry
//!
//! Registered sounds live in a slab of nodes threaded onto one of two
//! index-linked lists:
//! - the region list: registered but currently out of range or too quiet
//! - the active list: selected to play by the last ranking pass
//!
//! A node is on exactly one list at a time. New nodes and moved nodes are
//! linked at the head of their list.

use crate::sound::SoundKey;

/// Stable index of a node in the registry slab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Which list a node is threaded on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftList {
    Region,
    Active,
}

#[derive(Debug, Clone)]
struct SoftSoundNode {
    key: SoundKey,
    list: SoftList,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Slab-backed registry of soft-volume sounds
#[derive(Debug, Default)]
pub struct SoundRegistry {
    nodes: Vec<Option<SoftSoundNode>>,
    free: Vec<usize>,
    region_head: Option<usize>,
    active_head: Option<usize>,
    region_len: usize,
    active_len: usize,
    /// Node shown by the "next debug sound" cycle
    debug_cursor: Option<usize>,
}

impl SoundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sound. It waits on the region list until the next pass.
    pub fn register(&mut self, key: SoundKey) -> NodeId {
        let node = SoftSoundNode {
            key,
            list: SoftList::Region,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.link(idx, SoftList::Region);
        self.debug_cursor = None;
        NodeId(idx)
    }

    /// Unregister a sound, searching the active list before the region list.
    ///
    /// Returns false if the sound was not registered. That is expected when
    /// shutdown already booted it.
    pub fn unregister(&mut self, key: SoundKey) -> bool {
        self.debug_cursor = None;
        let found = self
            .find_in(SoftList::Active, key)
            .or_else(|| self.find_in(SoftList::Region, key));
        match found {
            Some(idx) => {
                self.unlink(idx);
                self.nodes[idx] = None;
                self.free.push(idx);
                true
            }
            None => false,
        }
    }

    /// Move a node to the head of `list`
    pub fn move_to(&mut self, node: NodeId, list: SoftList) {
        if self.node(node.0).is_none() {
            return;
        }
        self.unlink(node.0);
        self.link(node.0, list);
    }

    /// Remove every node, region list first, returning their keys
    pub fn drain(&mut self) -> Vec<SoundKey> {
        let mut keys = Vec::with_capacity(self.len());
        keys.extend(self.iter(SoftList::Region).map(|(_, key)| key));
        keys.extend(self.iter(SoftList::Active).map(|(_, key)| key));
        self.nodes.clear();
        self.free.clear();
        self.region_head = None;
        self.active_head = None;
        self.region_len = 0;
        self.active_len = 0;
        self.debug_cursor = None;
        keys
    }

    pub fn key(&self, node: NodeId) -> Option<SoundKey> {
        self.node(node.0).map(|n| n.key)
    }

    /// Which list a key is on, if registered
    pub fn list_of(&self, key: SoundKey) -> Option<SoftList> {
        self.nodes.iter().flatten().find(|n| n.key == key).map(|n| n.list)
    }

    /// Iterate a list in link order
    pub fn iter(&self, list: SoftList) -> impl Iterator<Item = (NodeId, SoundKey)> + '_ {
        let mut cursor = self.head_of(list);
        std::iter::from_fn(move || {
            let idx = cursor?;
            let node = self.node(idx)?;
            cursor = node.next;
            Some((NodeId(idx), node.key))
        })
    }

    pub fn len(&self) -> usize {
        self.region_len + self.active_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn region_len(&self) -> usize {
        self.region_len
    }

    pub fn active_len(&self) -> usize {
        self.active_len
    }

    /// Step the debug cursor: region list first, then the active list, then
    /// back to nothing.
    pub fn next_debug_sound(&mut self) -> Option<SoundKey> {
        self.debug_cursor = match self.debug_cursor.and_then(|idx| self.node(idx)) {
            None => self.region_head.or(self.active_head),
            Some(node) => match (node.next, node.list) {
                (Some(next), _) => Some(next),
                (None, SoftList::Region) => self.active_head,
                (None, SoftList::Active) => None,
            },
        };
        self.debug_sound()
    }

    /// Sound currently selected by the debug cursor
    pub fn debug_sound(&self) -> Option<SoundKey> {
        self.debug_cursor.and_then(|idx| self.node(idx)).map(|n| n.key)
    }

    fn node(&self, idx: usize) -> Option<&SoftSoundNode> {
        self.nodes.get(idx).and_then(|n| n.as_ref())
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut SoftSoundNode> {
        self.nodes.get_mut(idx).and_then(|n| n.as_mut())
    }

    fn head_of(&self, list: SoftList) -> Option<usize> {
        match list {
            SoftList::Region => self.region_head,
            SoftList::Active => self.active_head,
        }
    }

    fn find_in(&self, list: SoftList, key: SoundKey) -> Option<usize> {
        self.iter(list).find(|(_, k)| *k == key).map(|(id, _)| id.0)
    }

    fn link(&mut self, idx: usize, list: SoftList) {
        let old_head = self.head_of(list);
        if let Some(node) = self.node_mut(idx) {
            node.list = list;
            node.prev = None;
            node.next = old_head;
        }
        if let Some(head) = old_head.and_then(|h| self.node_mut(h)) {
            head.prev = Some(idx);
        }
        match list {
            SoftList::Region => {
                self.region_head = Some(idx);
                self.region_len += 1;
            }
            SoftList::Active => {
                self.active_head = Some(idx);
                self.active_len += 1;
            }
        }
    }

    fn unlink(&mut self, idx: usize) {
        let Some((list, prev, next)) = self.node(idx).map(|n| (n.list, n.prev, n.next)) else {
            return;
        };
        match prev {
            Some(p) => {
                if let Some(prev_node) = self.node_mut(p) {
                    prev_node.next = next;
                }
            }
            None => match list {
                SoftList::Region => self.region_head = next,
                SoftList::Active => self.active_head = next,
            },
        }
        if let Some(next_node) = next.and_then(|n| self.node_mut(n)) {
            next_node.prev = prev;
        }
        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = None;
        }
        match list {
            SoftList::Region => self.region_len -= 1,
            SoftList::Active => self.active_len -= 1,
        }
    }
}

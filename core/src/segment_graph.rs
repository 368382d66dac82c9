//! Segment graph: a DAG over input byte offsets.
//!
//! Every edge covers one tentative syllable (or code chunk); a path from the
//! start node to the end node is one way to split the input. At most one
//! node exists per offset. Nodes carry process-unique ids so that two graphs
//! never share a node: the lattice and the match-state caches key off these
//! ids, which is what makes incremental re-decoding sound after [`merge`]
//! splices a freshly parsed graph onto a preserved prefix.
//!
//! [`merge`]: SegmentGraph::merge

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;

/// Process-unique node identity. Offsets repeat across graphs; ids never do.
pub type SegmentGraphNodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_node_id() -> SegmentGraphNodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct SegmentGraphNode {
    id: SegmentGraphNodeId,
    start: usize,
    /// Successor offsets in insertion order, strictly greater than `start`.
    next: Vec<usize>,
}

impl SegmentGraphNode {
    pub fn id(&self) -> SegmentGraphNodeId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.start
    }

    pub fn next(&self) -> &[usize] {
        &self.next
    }
}

#[derive(Debug, Clone, Default)]
pub struct SegmentGraph {
    data: String,
    /// Indexed by offset, length `data.len() + 1`.
    nodes: Vec<Option<SegmentGraphNode>>,
    by_id: AHashMap<SegmentGraphNodeId, usize>,
}

impl SegmentGraph {
    /// A graph over `data` with only the start and end nodes.
    pub fn new(data: String) -> Self {
        let mut graph = Self {
            nodes: vec![None; data.len() + 1],
            by_id: AHashMap::new(),
            data,
        };
        graph.ensure_node(0);
        graph.ensure_node(graph.data.len());
        graph
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn start(&self) -> &SegmentGraphNode {
        self.nodes[0].as_ref().expect("start node always exists")
    }

    pub fn end(&self) -> &SegmentGraphNode {
        self.nodes[self.data.len()]
            .as_ref()
            .expect("end node always exists")
    }

    pub fn node_at(&self, offset: usize) -> Option<&SegmentGraphNode> {
        self.nodes.get(offset).and_then(|n| n.as_ref())
    }

    pub fn node_by_id(&self, id: SegmentGraphNodeId) -> Option<&SegmentGraphNode> {
        self.by_id.get(&id).and_then(|&off| self.node_at(off))
    }

    pub fn offset_of(&self, id: SegmentGraphNodeId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    fn ensure_node(&mut self, offset: usize) -> SegmentGraphNodeId {
        debug_assert!(offset <= self.data.len());
        if let Some(node) = &self.nodes[offset] {
            return node.id;
        }
        let node = SegmentGraphNode {
            id: fresh_node_id(),
            start: offset,
            next: Vec::new(),
        };
        let id = node.id;
        self.by_id.insert(id, offset);
        self.nodes[offset] = Some(node);
        id
    }

    /// Add a forward edge, creating both endpoints if needed.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        assert!(from < to && to <= self.data.len());
        self.ensure_node(to);
        self.ensure_node(from);
        let node = self.nodes[from].as_mut().unwrap();
        if !node.next.contains(&to) {
            node.next.push(to);
        }
    }

    /// The input slice covered by an edge.
    pub fn segment(&self, start: usize, end: usize) -> &str {
        &self.data[start..end]
    }

    /// Nodes in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &SegmentGraphNode> {
        self.nodes.iter().filter_map(|n| n.as_ref())
    }

    pub fn node_ids(&self) -> Vec<SegmentGraphNodeId> {
        self.iter().map(|n| n.id).collect()
    }

    /// Depth-first walk over full paths; `cb` gets the offsets after the
    /// start node and may return `false` to stop the walk.
    pub fn dfs(&self, cb: &mut dyn FnMut(&SegmentGraph, &[usize]) -> bool) {
        let mut path = Vec::new();
        self.dfs_helper(&mut path, 0, cb);
    }

    fn dfs_helper(
        &self,
        path: &mut Vec<usize>,
        offset: usize,
        cb: &mut dyn FnMut(&SegmentGraph, &[usize]) -> bool,
    ) -> bool {
        if offset == self.data.len() {
            return cb(self, path);
        }
        let nexts = match self.node_at(offset) {
            Some(node) => node.next.clone(),
            None => return true,
        };
        for to in nexts {
            path.push(to);
            if !self.dfs_helper(path, to, cb) {
                return false;
            }
            path.pop();
        }
        true
    }

    /// First offset at which this graph and `other` diverge: node presence,
    /// successor list, or covered text differs. Returns `other.size() + 1`
    /// when the graphs are structurally identical.
    pub fn check(&self, other: &SegmentGraph) -> usize {
        let limit = self.size().max(other.size());
        for offset in 0..=limit {
            let a = if offset <= self.size() {
                self.node_at(offset)
            } else {
                None
            };
            let b = if offset <= other.size() {
                other.node_at(offset)
            } else {
                None
            };
            match (a, b) {
                (None, None) => continue,
                (Some(a), Some(b)) => {
                    if a.next != b.next {
                        return offset;
                    }
                    for &to in &a.next {
                        if to > other.size() || self.segment(offset, to) != other.segment(offset, to)
                        {
                            return offset;
                        }
                    }
                }
                _ => return offset,
            }
        }
        other.size() + 1
    }

    /// Splice `other` onto this graph, keeping node identities strictly
    /// before `since` and adopting `other`'s nodes from `since` on.
    /// Returns the ids of the discarded nodes so the lattice and the match
    /// caches can drop their entries.
    ///
    /// `since` must come from [`SegmentGraph::check`] against `other`: the
    /// preserved prefix has identical successor lists in both graphs, so no
    /// edge fixups are needed (edges are stored as offsets).
    pub fn merge(&mut self, mut other: SegmentGraph, since: usize) -> Vec<SegmentGraphNodeId> {
        if since > other.size() {
            return Vec::new();
        }
        let mut removed = Vec::new();
        for offset in since..=self.size() {
            if let Some(node) = self.nodes[offset].take() {
                self.by_id.remove(&node.id);
                removed.push(node.id);
            }
        }
        let new_len = other.data.len();
        self.data = std::mem::take(&mut other.data);
        self.nodes.resize(new_len + 1, None);
        for offset in since..=new_len {
            if let Some(node) = other.nodes[offset].take() {
                self.by_id.insert(node.id, offset);
                self.nodes[offset] = Some(node);
            }
        }
        removed
    }
}

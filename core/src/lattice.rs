//! Word lattice over a segment graph.
//!
//! Lattice nodes live in an arena owned by the [`Lattice`]; node identity is
//! the arena index and the Viterbi back-pointer is an index too, so there
//! are no real cycles to manage. Nodes are grouped by the segment-graph node
//! their path ends at, which is the access pattern of both decoder passes.
//!
//! Front-ends attach format-specific payloads (the encoded pinyin of a
//! word, table flags) through an untyped extension blob, keeping the
//! decoder generic.

use ahash::AHashMap;

use crate::language_model::{State, WordIndex};
use crate::segment_graph::SegmentGraphNodeId;

/// A dictionary word paired with its language-model vocabulary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordNode {
    word: String,
    idx: WordIndex,
}

impl WordNode {
    pub fn new(word: impl Into<String>, idx: WordIndex) -> Self {
        Self {
            word: word.into(),
            idx,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn idx(&self) -> WordIndex {
        self.idx
    }

    pub fn set_idx(&mut self, idx: WordIndex) {
        self.idx = idx;
    }
}

/// Extension blob tags.
pub const DATA_NONE: u8 = 0;
pub const DATA_PINYIN: u8 = 1;
pub const DATA_TABLE: u8 = 2;

/// Untyped per-node payload: a tag plus format-defined bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatticeNodeData {
    pub tag: u8,
    pub bytes: Vec<u8>,
}

impl LatticeNodeData {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn pinyin(encoded: Vec<u8>) -> Self {
        Self {
            tag: DATA_PINYIN,
            bytes: encoded,
        }
    }

    /// Table payload: the entry flag followed by the stored code bytes.
    pub fn table(flag: u8, code: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(1 + code.len());
        bytes.push(flag);
        bytes.extend_from_slice(code);
        Self {
            tag: DATA_TABLE,
            bytes,
        }
    }

    pub fn is_none(&self) -> bool {
        self.tag == DATA_NONE
    }

    /// Encoded pinyin bytes, if this payload carries any.
    pub fn encoded_pinyin(&self) -> Option<&[u8]> {
        (self.tag == DATA_PINYIN).then_some(self.bytes.as_slice())
    }

    /// Table entry flag, if this payload carries one.
    pub fn table_flag(&self) -> Option<u8> {
        if self.tag == DATA_TABLE {
            self.bytes.first().copied()
        } else {
            None
        }
    }

    /// Stored dictionary code of a table word, which may extend past the
    /// typed portion when the match completed a partial code.
    pub fn table_code(&self) -> Option<&[u8]> {
        if self.tag == DATA_TABLE && !self.bytes.is_empty() {
            Some(&self.bytes[1..])
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct LatticeNode {
    pub word: WordNode,
    /// Segment-graph nodes this word covers; sentinels have a single entry,
    /// real words at least two (from, .., to).
    pub path: Vec<SegmentGraphNodeId>,
    pub from_offset: usize,
    pub to_offset: usize,
    /// Unit cost from the dictionary (log10 adjustment, 0 = neutral).
    pub cost: f32,
    /// Cumulative best score from BOS; set by the decoder.
    pub score: f32,
    /// Language-model state after this word on its best path.
    pub state: State,
    /// Arena index of the best predecessor; `None` for BOS and unreached
    /// nodes.
    pub prev: Option<usize>,
    pub data: LatticeNodeData,
}

impl LatticeNode {
    pub fn from_node(&self) -> SegmentGraphNodeId {
        self.path[0]
    }

    pub fn to_node(&self) -> SegmentGraphNodeId {
        *self.path.last().unwrap()
    }
}

/// One decoded sentence: an owned snapshot that stays valid after the
/// lattice is pruned or rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceWord {
    pub word: String,
    pub idx: WordIndex,
    /// Covered byte range of the input.
    pub from: usize,
    pub to: usize,
    pub data: LatticeNodeData,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceResult {
    pub words: Vec<SentenceWord>,
    pub score: f32,
}

impl SentenceResult {
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.word.as_str()).collect()
    }

    /// End of the covered input range.
    pub fn to_offset(&self) -> usize {
        self.words.last().map(|w| w.to).unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct Lattice {
    arena: Vec<LatticeNode>,
    by_to: AHashMap<SegmentGraphNodeId, Vec<usize>>,
    sentences: Vec<SentenceResult>,
}

impl Lattice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.by_to.clear();
        self.sentences.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn node(&self, idx: usize) -> &LatticeNode {
        &self.arena[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut LatticeNode {
        &mut self.arena[idx]
    }

    /// Arena indices of the nodes whose path ends at `to`.
    pub fn nodes(&self, to: SegmentGraphNodeId) -> &[usize] {
        self.by_to.get(&to).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_nodes(&self, to: SegmentGraphNodeId) -> bool {
        self.by_to.get(&to).is_some_and(|v| !v.is_empty())
    }

    pub fn add_node(&mut self, node: LatticeNode) -> usize {
        let to = node.to_node();
        let idx = self.arena.len();
        self.arena.push(node);
        self.by_to.entry(to).or_default().push(idx);
        idx
    }

    /// Reorder and truncate the node list of one graph node; used by beam
    /// pruning.
    pub fn set_nodes(&mut self, to: SegmentGraphNodeId, indices: Vec<usize>) {
        self.by_to.insert(to, indices);
    }

    pub fn sentence_size(&self) -> usize {
        self.sentences.len()
    }

    pub fn sentence(&self, idx: usize) -> Option<&SentenceResult> {
        self.sentences.get(idx)
    }

    pub fn sentences(&self) -> &[SentenceResult] {
        &self.sentences
    }

    pub fn set_sentences(&mut self, sentences: Vec<SentenceResult>) {
        self.sentences = sentences;
    }

    /// Drop every node keyed by a removed graph node and compact the arena.
    /// Scores, states and back-pointers are decoder state and are left to
    /// the next decode to recompute.
    pub fn discard_node(&mut self, removed: &ahash::AHashSet<SegmentGraphNodeId>) {
        if removed.is_empty() {
            return;
        }
        self.by_to.retain(|to, _| !removed.contains(to));
        self.sentences.clear();
        self.compact();
    }

    fn compact(&mut self) {
        let mut keep: Vec<usize> = self.by_to.values().flatten().copied().collect();
        keep.sort_unstable();
        keep.dedup();
        let mut remap: AHashMap<usize, usize> = AHashMap::with_capacity(keep.len());
        let mut arena = Vec::with_capacity(keep.len());
        for old_idx in keep {
            remap.insert(old_idx, arena.len());
            let mut node = self.arena[old_idx].clone();
            node.prev = None;
            arena.push(node);
        }
        self.arena = arena;
        for list in self.by_to.values_mut() {
            for idx in list.iter_mut() {
                *idx = remap[idx];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    fn word_node(word: &str, path: Vec<SegmentGraphNodeId>, from: usize, to: usize) -> LatticeNode {
        LatticeNode {
            word: WordNode::new(word, 0),
            path,
            from_offset: from,
            to_offset: to,
            cost: 0.0,
            score: 0.0,
            state: Vec::new(),
            prev: None,
            data: LatticeNodeData::none(),
        }
    }

    #[test]
    fn test_nodes_grouped_by_to() {
        let mut lattice = Lattice::new();
        lattice.add_node(word_node("你", vec![1, 2], 0, 2));
        lattice.add_node(word_node("你好", vec![1, 3], 0, 5));
        lattice.add_node(word_node("好", vec![2, 3], 2, 5));
        assert_eq!(lattice.nodes(2).len(), 1);
        assert_eq!(lattice.nodes(3).len(), 2);
        assert!(lattice.nodes(9).is_empty());
    }

    #[test]
    fn test_discard_node_compacts() {
        let mut lattice = Lattice::new();
        lattice.add_node(word_node("你", vec![1, 2], 0, 2));
        lattice.add_node(word_node("你好", vec![1, 3], 0, 5));
        let mut removed = AHashSet::new();
        removed.insert(3u64);
        lattice.discard_node(&removed);
        assert_eq!(lattice.nodes(2).len(), 1);
        assert!(lattice.nodes(3).is_empty());
        let idx = lattice.nodes(2)[0];
        assert_eq!(lattice.node(idx).word.word(), "你");
    }

    #[test]
    fn test_sentence_snapshot_survives_clear() {
        let mut lattice = Lattice::new();
        lattice.set_sentences(vec![SentenceResult {
            words: vec![SentenceWord {
                word: "你好".into(),
                idx: 0,
                from: 0,
                to: 5,
                data: LatticeNodeData::pinyin(vec![1, 2, 3, 4]),
            }],
            score: -1.0,
        }]);
        let snapshot = lattice.sentence(0).cloned().unwrap();
        lattice.clear();
        assert_eq!(snapshot.text(), "你好");
        assert_eq!(snapshot.words[0].data.encoded_pinyin(), Some(&[1u8, 2, 3, 4][..]));
    }
}

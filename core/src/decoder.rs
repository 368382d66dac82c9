//! Lattice decoder: forward dictionary match, beam-pruned Viterbi, lazy
//! N-best extraction.
//!
//! The decoder is generic over the dictionary; front-ends supply their
//! match-state helper type for incremental re-decoding. Scores are
//! cumulative base-10 log probabilities (higher is better); dictionary
//! costs are additive adjustments on the same scale.
//!
//! Incremental contract: graph nodes whose lattice entries survived the
//! last edit (the context calls [`Lattice::discard_node`] with the merge
//! diff) are not re-matched; their nodes are rescored in place. A decode
//! without a helper over a dirty lattice must be preceded by
//! [`Lattice::clear`].

use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use tracing::trace;

use crate::language_model::{LanguageModelBase, State, UNKNOWN_WORD};
use crate::lattice::{
    Lattice, LatticeNode, LatticeNodeData, SentenceResult, SentenceWord, WordNode,
};
use crate::segment_graph::{SegmentGraph, SegmentGraphNodeId};

/// A word source the decoder can match over a segment graph.
pub trait Dictionary {
    /// Per-context memoization passed through [`Decoder::decode`].
    type MatchHelper;

    /// Invoke `cb(path, word, cost, data)` for every dictionary word whose
    /// code sequence matches a path through the graph. Callback order is
    /// unspecified; the decoder deduplicates by graph node.
    fn match_prefix(
        &self,
        graph: &SegmentGraph,
        helper: Option<&mut Self::MatchHelper>,
        cb: &mut dyn FnMut(&[SegmentGraphNodeId], WordNode, f32, LatticeNodeData),
    );
}

pub const BEAM_SIZE_DEFAULT: usize = 2000;
pub const FRAME_SIZE_DEFAULT: usize = 10;

#[derive(Debug, Clone)]
pub struct DecodeParams {
    pub nbest: usize,
    /// Language-model state the sentence starts from.
    pub state: State,
    /// Reject sentences scoring further than this below the best one.
    pub max_distance: f32,
    pub min_score: f32,
    pub beam_size: usize,
    pub frame_size: usize,
}

impl DecodeParams {
    pub fn new(state: State) -> Self {
        Self {
            nbest: 1,
            state,
            max_distance: f32::MAX,
            min_score: f32::MIN,
            beam_size: BEAM_SIZE_DEFAULT,
            frame_size: FRAME_SIZE_DEFAULT,
        }
    }

    pub fn with_nbest(mut self, nbest: usize) -> Self {
        self.nbest = nbest.max(1);
        self
    }
}

/// Heap entry for the lazy k-best pass. Ordered by score estimate, which
/// is exact for the completed prefix plus the already-fixed suffix.
struct KBestItem {
    est: f32,
    /// Arena index of the current node; `None` stands for EOS.
    node: Option<usize>,
    /// Arena indices of the words after `node`, in sentence order.
    suffix: Vec<usize>,
}

impl PartialEq for KBestItem {
    fn eq(&self, other: &Self) -> bool {
        self.est == other.est
    }
}
impl Eq for KBestItem {}
impl PartialOrd for KBestItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for KBestItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.est.total_cmp(&other.est)
    }
}

pub struct Decoder;

impl Decoder {
    pub fn decode<D: Dictionary>(
        dict: &D,
        model: &dyn LanguageModelBase,
        lattice: &mut Lattice,
        graph: &SegmentGraph,
        params: &DecodeParams,
        helper: Option<&mut D::MatchHelper>,
    ) {
        if graph.size() == 0 {
            lattice.set_sentences(Vec::new());
            return;
        }
        let start_id = graph.start().id();
        let end_id = graph.end().id();

        // Graph nodes whose lattice entries survived the last edit.
        let populated: AHashSet<SegmentGraphNodeId> = graph
            .iter()
            .map(|n| n.id())
            .filter(|id| lattice.has_nodes(*id))
            .collect();

        // 1. Forward dictionary match.
        let mut matched: Vec<LatticeNode> = Vec::new();
        dict.match_prefix(graph, helper, &mut |path, word, cost, data| {
            debug_assert!(path.len() >= 2);
            let to = *path.last().unwrap();
            if populated.contains(&to) {
                return;
            }
            matched.push(LatticeNode {
                word,
                from_offset: graph.offset_of(path[0]).unwrap_or(0),
                to_offset: graph.offset_of(to).unwrap_or(0),
                path: path.to_vec(),
                cost,
                score: f32::NEG_INFINITY,
                state: State::new(),
                prev: None,
                data,
            });
        });
        trace!(nodes = matched.len(), "dictionary match produced lattice nodes");
        for mut node in matched {
            if node.word.idx() == UNKNOWN_WORD {
                let idx = model.index(node.word.word());
                node.word.set_idx(idx);
            }
            lattice.add_node(node);
        }

        // Begin-of-sentence sentinel at the start node.
        let bos_idx = match lattice
            .nodes(start_id)
            .iter()
            .copied()
            .find(|&i| lattice.node(i).path.len() == 1)
        {
            Some(i) => i,
            None => lattice.add_node(LatticeNode {
                word: WordNode::new("", model.begin_sentence()),
                path: vec![start_id],
                from_offset: 0,
                to_offset: 0,
                cost: 0.0,
                score: 0.0,
                state: params.state.clone(),
                prev: None,
                data: LatticeNodeData::none(),
            }),
        };
        {
            let bos = lattice.node_mut(bos_idx);
            bos.score = 0.0;
            bos.state = params.state.clone();
            bos.prev = None;
        }

        // In-edge offsets, for the unmatched-segment fallback.
        let mut in_edges: AHashMap<usize, Vec<usize>> = AHashMap::new();
        for node in graph.iter() {
            for &to in node.next() {
                in_edges.entry(to).or_default().push(node.index());
            }
        }

        // 2. Viterbi DP in offset order with per-node beam pruning.
        for gnode in graph.iter() {
            let offset = gnode.index();
            let gid = gnode.id();
            if offset == 0 {
                continue;
            }
            if !lattice.has_nodes(gid) {
                // No dictionary word ends here: fall back to a literal
                // segment per in-edge so the search stays connected.
                let froms = in_edges.get(&offset).cloned().unwrap_or_default();
                for from_off in froms {
                    let from_id = match graph.node_at(from_off) {
                        Some(n) => n.id(),
                        None => continue,
                    };
                    let text = graph.segment(from_off, offset).to_string();
                    let idx = model.index(&text);
                    lattice.add_node(LatticeNode {
                        word: WordNode::new(text, idx),
                        path: vec![from_id, gid],
                        from_offset: from_off,
                        to_offset: offset,
                        cost: 0.0,
                        score: f32::NEG_INFINITY,
                        state: State::new(),
                        prev: None,
                        data: LatticeNodeData::none(),
                    });
                }
            }

            let indices: Vec<usize> = lattice.nodes(gid).to_vec();
            for &idx in &indices {
                let (from_id, cost, word) = {
                    let n = lattice.node(idx);
                    (n.from_node(), n.cost, n.word.clone())
                };
                let mut best: Option<(f32, usize, State, String)> = None;
                let mut out = State::new();
                for &p in lattice.nodes(from_id) {
                    let pred = lattice.node(p);
                    if !pred.score.is_finite() {
                        continue;
                    }
                    let lm_score = model.score(&pred.state, &word, &mut out);
                    let total = pred.score + cost + lm_score;
                    let replace = match &best {
                        None => true,
                        Some((cur, _, _, cur_word)) => {
                            total > *cur
                                || (total == *cur && pred.word.word() < cur_word.as_str())
                        }
                    };
                    if replace {
                        best = Some((
                            total,
                            p,
                            std::mem::take(&mut out),
                            lattice.node(p).word.word().to_string(),
                        ));
                    }
                }
                let node = lattice.node_mut(idx);
                match best {
                    Some((score, prev, state, _)) => {
                        node.score = score;
                        node.prev = Some(prev);
                        node.state = state;
                    }
                    None => {
                        node.score = f32::NEG_INFINITY;
                        node.prev = None;
                    }
                }
            }

            // Keep the node list score-sorted; the k-best pass relies on it.
            let mut sorted = indices;
            sorted.sort_by(|&a, &b| {
                lattice
                    .node(b)
                    .score
                    .total_cmp(&lattice.node(a).score)
                    .then_with(|| lattice.node(a).word.word().cmp(lattice.node(b).word.word()))
            });
            sorted.truncate(params.beam_size.max(1));
            lattice.set_nodes(gid, sorted);
        }

        // 3. End-of-sentence closure.
        let mut eos = LatticeNode {
            word: WordNode::new("", model.end_sentence()),
            path: vec![end_id],
            from_offset: graph.size(),
            to_offset: graph.size(),
            cost: 0.0,
            score: f32::NEG_INFINITY,
            state: State::new(),
            prev: None,
            data: LatticeNodeData::none(),
        };
        {
            let mut out = State::new();
            let mut best: Option<(f32, usize, State, String)> = None;
            for &p in lattice.nodes(end_id) {
                let pred = lattice.node(p);
                if !pred.score.is_finite() {
                    continue;
                }
                let lm_score = model.score(&pred.state, &eos.word, &mut out);
                let total = pred.score + lm_score;
                let replace = match &best {
                    None => true,
                    Some((cur, _, _, cur_word)) => {
                        total > *cur || (total == *cur && pred.word.word() < cur_word.as_str())
                    }
                };
                if replace {
                    best = Some((
                        total,
                        p,
                        std::mem::take(&mut out),
                        pred.word.word().to_string(),
                    ));
                }
            }
            if let Some((score, prev, state, _)) = best {
                eos.score = score;
                eos.prev = Some(prev);
                eos.state = state;
            }
        }
        if !eos.score.is_finite() {
            lattice.set_sentences(Vec::new());
            return;
        }

        // 4. Lazy k-best expansion from EOS.
        let sentences = Self::k_best(model, lattice, &eos, start_id, end_id, bos_idx, params);
        lattice.set_sentences(sentences);
    }

    fn k_best(
        model: &dyn LanguageModelBase,
        lattice: &Lattice,
        eos: &LatticeNode,
        _start_id: SegmentGraphNodeId,
        end_id: SegmentGraphNodeId,
        bos_idx: usize,
        params: &DecodeParams,
    ) -> Vec<SentenceResult> {
        let best_score = eos.score;
        let mut heap: BinaryHeap<KBestItem> = BinaryHeap::new();
        heap.push(KBestItem {
            est: eos.score,
            node: None,
            suffix: Vec::new(),
        });

        let mut results: Vec<SentenceResult> = Vec::new();
        let mut seen: AHashSet<String> = AHashSet::new();
        let mut scratch = State::new();

        while let Some(item) = heap.pop() {
            if results.len() >= params.nbest.max(1) {
                break;
            }
            // The heap pops in non-increasing order, so one rejection ends it.
            if item.est < params.min_score || item.est < best_score - params.max_distance {
                break;
            }

            if item.node == Some(bos_idx) {
                let words: Vec<SentenceWord> = item
                    .suffix
                    .iter()
                    .map(|&i| {
                        let n = lattice.node(i);
                        SentenceWord {
                            word: n.word.word().to_string(),
                            idx: n.word.idx(),
                            from: n.from_offset,
                            to: n.to_offset,
                            data: n.data.clone(),
                        }
                    })
                    .collect();
                let result = SentenceResult {
                    words,
                    score: item.est,
                };
                if seen.insert(result.text()) {
                    results.push(result);
                }
                continue;
            }

            let (from_id, node_cost, node_word, node_score) = match item.node {
                None => (end_id, eos.cost, eos.word.clone(), eos.score),
                Some(i) => {
                    let n = lattice.node(i);
                    (n.from_node(), n.cost, n.word.clone(), n.score)
                }
            };
            for &p in lattice
                .nodes(from_id)
                .iter()
                .take(params.frame_size.max(1))
            {
                let pred = lattice.node(p);
                if !pred.score.is_finite() {
                    continue;
                }
                let edge = node_cost + model.score(&pred.state, &node_word, &mut scratch);
                let est = pred.score + edge + (item.est - node_score);
                let mut suffix = Vec::with_capacity(item.suffix.len() + 1);
                if let Some(i) = item.node {
                    suffix.push(i);
                }
                suffix.extend_from_slice(&item.suffix);
                heap.push(KBestItem {
                    est,
                    node: Some(p),
                    suffix,
                });
            }
        }
        results
    }
}

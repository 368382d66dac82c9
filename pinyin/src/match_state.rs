//! Per-context memoization of dictionary trie walks.
//!
//! The decoder's forward pass is deterministic per (segment-graph node,
//! trie layer, enabled fuzzy rules), so after one more keystroke the
//! walks that arrived at preserved graph nodes are still valid. Three
//! structures capture that:
//!
//! - `search`: graph node -> open trie walks ending there; keyed by node
//!   identity, discarded with the graph diff,
//! - `node_cache`: per layer, matched-text -> walk result, so retyping a
//!   prefix reuses the walk even across cleared graphs,
//! - `match_cache`: per layer, matched-text -> emitted (word, cost,
//!   encoded-pinyin) items.
//!
//! Changing the fuzzy flags or the shuangpin profile invalidates
//! everything; a `dictionary_changed(layer)` signal invalidates one layer
//! (trie states are dense-array positions and do not survive mutation).

use std::rc::Rc;

use ahash::{AHashMap, AHashSet};

use libshuru_core::{LruMap, SegmentGraphNodeId};

use crate::shuangpin::ShuangpinProfile;
use crate::syllable::FuzzyFlags;

/// One live position inside a trie walk, with the concrete code bytes it
/// consumed (fuzzy and wildcard matches make these differ from the typed
/// text) and the penalty accumulated on the way.
#[derive(Debug, Clone)]
pub struct PosEntry {
    pub trie_pos: usize,
    pub code: Vec<u8>,
    pub penalty: f32,
}

/// Result of matching one stretch of typed text against one trie layer.
#[derive(Debug)]
pub struct MatchResult {
    pub layer: usize,
    /// Matched code length in bytes (2 per syllable).
    pub size: usize,
    pub pos: Vec<PosEntry>,
}

/// An open walk attached to the graph node its path ends at.
#[derive(Debug, Clone)]
pub struct TrieEdge {
    pub result: Rc<MatchResult>,
    pub path: Vec<SegmentGraphNodeId>,
}

/// A completed word emitted by a walk.
#[derive(Debug, Clone)]
pub struct MatchItem {
    pub word: String,
    pub cost: f32,
    pub encoded: Vec<u8>,
}

#[derive(Debug)]
pub struct PinyinMatchState {
    flags: FuzzyFlags,
    shuangpin: Option<Rc<ShuangpinProfile>>,
    pub(crate) search: AHashMap<SegmentGraphNodeId, Vec<TrieEdge>>,
    pub(crate) node_cache: Vec<LruMap<String, Rc<MatchResult>>>,
    pub(crate) match_cache: Vec<LruMap<String, Rc<Vec<MatchItem>>>>,
}

impl PinyinMatchState {
    pub fn new(flags: FuzzyFlags) -> Self {
        Self {
            flags,
            shuangpin: None,
            search: AHashMap::new(),
            node_cache: Vec::new(),
            match_cache: Vec::new(),
        }
    }

    pub fn flags(&self) -> FuzzyFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: FuzzyFlags) {
        if self.flags != flags {
            self.flags = flags;
            self.clear();
        }
    }

    pub fn shuangpin(&self) -> Option<&Rc<ShuangpinProfile>> {
        self.shuangpin.as_ref()
    }

    pub fn set_shuangpin(&mut self, profile: Option<Rc<ShuangpinProfile>>) {
        let same = match (&self.shuangpin, &profile) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        if !same {
            self.shuangpin = profile;
            self.clear();
        }
    }

    pub(crate) fn ensure_layers(&mut self, n: usize) {
        while self.node_cache.len() < n {
            self.node_cache.push(LruMap::default());
            self.match_cache.push(LruMap::default());
        }
    }

    /// Drop walks attached to removed graph nodes (and thereby every walk
    /// whose path started at one of them: a walk lives on the node its
    /// path ends at, and paths never span a removed prefix).
    pub fn discard_node(&mut self, removed: &AHashSet<SegmentGraphNodeId>) {
        if removed.is_empty() {
            return;
        }
        self.search.retain(|node, _| !removed.contains(node));
    }

    /// Forget everything derived from one dictionary layer.
    pub fn discard_dictionary(&mut self, layer: usize) {
        if let Some(cache) = self.node_cache.get_mut(layer) {
            cache.clear();
        }
        if let Some(cache) = self.match_cache.get_mut(layer) {
            cache.clear();
        }
        for edges in self.search.values_mut() {
            edges.retain(|e| e.result.layer != layer);
        }
    }

    /// Drop the graph-node walks but keep the text-keyed caches.
    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    pub fn clear(&mut self) {
        self.search.clear();
        for cache in &mut self.node_cache {
            cache.clear();
        }
        for cache in &mut self.match_cache {
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(layer: usize, path: Vec<SegmentGraphNodeId>) -> TrieEdge {
        TrieEdge {
            result: Rc::new(MatchResult {
                layer,
                size: 2,
                pos: Vec::new(),
            }),
            path,
        }
    }

    #[test]
    fn test_discard_node() {
        let mut state = PinyinMatchState::new(FuzzyFlags::NONE);
        state.search.insert(1, vec![edge(0, vec![0, 1])]);
        state.search.insert(2, vec![edge(0, vec![1, 2])]);
        let mut removed = AHashSet::new();
        removed.insert(2u64);
        state.discard_node(&removed);
        assert!(state.search.contains_key(&1));
        assert!(!state.search.contains_key(&2));
    }

    #[test]
    fn test_discard_dictionary_layer() {
        let mut state = PinyinMatchState::new(FuzzyFlags::NONE);
        state.ensure_layers(2);
        state
            .search
            .insert(1, vec![edge(0, vec![0, 1]), edge(1, vec![0, 1])]);
        state.match_cache[1].insert("ni".to_string(), Rc::new(Vec::new()));
        state.discard_dictionary(1);
        assert_eq!(state.search[&1].len(), 1);
        assert_eq!(state.search[&1][0].result.layer, 0);
        assert!(state.match_cache[1].is_empty());
    }

    #[test]
    fn test_flag_change_invalidates() {
        let mut state = PinyinMatchState::new(FuzzyFlags::NONE);
        state.search.insert(1, vec![edge(0, vec![0, 1])]);
        state.set_flags(FuzzyFlags::NONE);
        assert!(!state.search.is_empty());
        state.set_flags(FuzzyFlags::INNER);
        assert!(state.search.is_empty());
    }
}

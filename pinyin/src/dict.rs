//! Pinyin dictionary: layered double-array tries over syllable codes.
//!
//! Key layout: 2 bytes per syllable, a separator byte, then the UTF-8
//! word; the value is the word's log10 cost adjustment (0 = neutral).
//! Layer 0 is the system dictionary, layer 1 the user dictionary, layers
//! 2+ optional extras.
//!
//! `match_prefix` drives the decoder's forward pass: it walks every trie
//! layer along every segment-graph path, forking on fuzzy twins (at a
//! fixed penalty per fuzzy syllable) and fanning an initial-only syllable
//! out to every final valid with it (at a steeper penalty, so complete
//! spellings win ties). Walks and word emissions are memoized in the
//! caller's [`PinyinMatchState`].

use std::io::{Read, Write};
use std::rc::Rc;

use ahash::AHashMap;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::info;

use libshuru_core::{
    Connection, DatTrie, Dictionary, Error, LatticeNodeData, Result, SegmentGraph,
    SegmentGraphNodeId, TrieDictionary, WordNode, UNKNOWN_WORD,
};

use crate::encoder::{PinyinEncoder, SyllableReadings};
use crate::match_state::{MatchItem, MatchResult, PinyinMatchState, PosEntry, TrieEdge};
use crate::syllable::{FuzzyFlags, PinyinFinal, PinyinInitial, CODE_SEPARATOR};

/// Penalty per fuzzy-matched syllable, log10(1/2).
const FUZZY_COST: f32 = -0.30103;
/// Penalty per initial-only wildcard syllable, one decade.
const WILDCARD_COST: f32 = -1.0;

const DICT_MAGIC: &[u8; 4] = b"SPYD";
const DICT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinyinDictFormat {
    Text,
    Binary,
}

#[derive(Debug, Default)]
pub struct PinyinDictionary {
    base: TrieDictionary<f32>,
}

impl PinyinDictionary {
    pub fn new() -> Self {
        Self {
            base: TrieDictionary::new(),
        }
    }

    pub fn dict_size(&self) -> usize {
        self.base.dict_size()
    }

    pub fn add_empty_dict(&mut self) -> usize {
        self.base.add_empty_dict()
    }

    /// Remove an extra layer; the system and user layers are fixed.
    pub fn remove(&mut self, idx: usize) -> Result<()> {
        self.base.remove(idx)
    }

    pub fn remove_all(&mut self) {
        self.base.remove_all();
    }

    pub fn clear(&mut self, idx: usize) -> Result<()> {
        self.base.clear(idx)
    }

    pub fn connect_changed(&self, f: impl Fn(&usize) + 'static) -> Connection {
        self.base.connect_changed(f)
    }

    pub fn disconnect_changed(&self, conn: Connection) {
        self.base.disconnect_changed(conn);
    }

    fn make_key(code: &[u8], word: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(code.len() + 1 + word.len());
        key.extend_from_slice(code);
        key.push(CODE_SEPARATOR);
        key.extend_from_slice(word.as_bytes());
        key
    }

    /// Insert a word under an already-encoded code sequence.
    pub fn add_word(&mut self, idx: usize, code: &[u8], word: &str, cost: f32) -> Result<()> {
        if code.is_empty() || code.len() % 2 != 0 {
            return Err(Error::invalid_argument("invalid encoded pinyin length"));
        }
        let key = Self::make_key(code, word);
        self.base.trie_mut(idx)?.set(&key, cost);
        self.base.emit_changed(idx);
        Ok(())
    }

    /// Insert a word spelled as `'`-joined full pinyin.
    pub fn add_full_pinyin_word(
        &mut self,
        idx: usize,
        word: &str,
        pinyin: &str,
        cost: f32,
    ) -> Result<()> {
        let code = PinyinEncoder::encode_full_pinyin(pinyin)?;
        self.add_word(idx, &code, word, cost)
    }

    /// Remove a word; returns whether it was present.
    pub fn remove_word(&mut self, idx: usize, pinyin: &str, word: &str) -> Result<bool> {
        let code = PinyinEncoder::encode_full_pinyin(pinyin)?;
        let key = Self::make_key(&code, word);
        let removed = self.base.trie_mut(idx)?.erase(&key).is_some();
        if removed {
            self.base.emit_changed(idx);
        }
        Ok(removed)
    }

    /// True if any layer stores the word under this code.
    pub fn word_exists(&self, code: &[u8], word: &str) -> bool {
        let key = Self::make_key(code, word);
        self.base.tries().iter().any(|t| t.contains(&key))
    }

    /// Exact-code lookup across all layers. `cb(encoded, word, cost)`
    /// returns `false` to stop.
    pub fn match_words(&self, code: &[u8], cb: &mut dyn FnMut(&[u8], &str, f32) -> bool) {
        for trie in self.base.tries() {
            let mut pos = DatTrie::<f32>::root_pos();
            if !trie.traverse(code, &mut pos).is_path() {
                continue;
            }
            if !trie.traverse(&[CODE_SEPARATOR], &mut pos).is_path() {
                continue;
            }
            let mut keep_going = true;
            trie.foreach_at(pos, |cost, len, state| {
                let word_bytes = trie.suffix(state, len);
                if let Ok(word) = std::str::from_utf8(&word_bytes) {
                    keep_going = cb(code, word, cost);
                }
                keep_going
            });
            if !keep_going {
                return;
            }
        }
    }

    /// Prefix lookup: every word whose code starts with `code`.
    pub fn match_words_prefix(&self, code: &[u8], cb: &mut dyn FnMut(&[u8], &str, f32) -> bool) {
        for trie in self.base.tries() {
            let mut pos = DatTrie::<f32>::root_pos();
            if !trie.traverse(code, &mut pos).is_path() {
                continue;
            }
            let mut keep_going = true;
            trie.foreach_at(pos, |cost, len, state| {
                let tail = trie.suffix(state, len);
                if let Some(sep) = tail.iter().position(|&b| b == CODE_SEPARATOR) {
                    if let Ok(word) = std::str::from_utf8(&tail[sep + 1..]) {
                        let mut encoded = code.to_vec();
                        encoded.extend_from_slice(&tail[..sep]);
                        keep_going = cb(&encoded, word, cost);
                    }
                }
                keep_going
            });
            if !keep_going {
                return;
            }
        }
    }

    /// Load one layer from a stream, replacing its contents.
    pub fn load<R: Read>(
        &mut self,
        idx: usize,
        reader: &mut R,
        format: PinyinDictFormat,
    ) -> Result<()> {
        let trie = match format {
            PinyinDictFormat::Text => Self::load_text(reader)?,
            PinyinDictFormat::Binary => Self::load_binary(reader)?,
        };
        info!(layer = idx, words = trie.len(), "loaded pinyin dictionary");
        self.base.replace_trie(idx, trie)
    }

    fn load_text<R: Read>(reader: &mut R) -> Result<DatTrie<f32>> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => {
                    Error::invalid_format("dictionary text is not valid UTF-8")
                }
                _ => Error::Io(e),
            })?;
        let mut trie = DatTrie::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let word = parts.next();
            let pinyin = parts.next();
            let (word, pinyin) = match (word, pinyin) {
                (Some(w), Some(p)) => (w, p),
                _ => {
                    return Err(Error::invalid_format(format!(
                        "dictionary line {}: expected WORD PINYIN [COST]",
                        lineno + 1
                    )))
                }
            };
            let cost = match parts.next() {
                Some(c) => c.parse::<f32>().map_err(|_| {
                    Error::invalid_format(format!("dictionary line {}: bad cost", lineno + 1))
                })?,
                None => 0.0,
            };
            let code = PinyinEncoder::encode_full_pinyin(pinyin).map_err(|_| {
                Error::invalid_format(format!(
                    "dictionary line {}: invalid pinyin {pinyin}",
                    lineno + 1
                ))
            })?;
            trie.set(&Self::make_key(&code, word), cost);
        }
        Ok(trie)
    }

    fn load_binary<R: Read>(reader: &mut R) -> Result<DatTrie<f32>> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::invalid_format("truncated pinyin dictionary")
            } else {
                Error::Io(e)
            }
        })?;
        if &magic != DICT_MAGIC {
            return Err(Error::invalid_format("bad pinyin dictionary magic"));
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != DICT_VERSION {
            return Err(Error::invalid_format(format!(
                "unsupported pinyin dictionary version {version}"
            )));
        }
        DatTrie::load(reader)
    }

    /// Save one layer.
    pub fn save<W: Write>(
        &self,
        idx: usize,
        writer: &mut W,
        format: PinyinDictFormat,
    ) -> Result<()> {
        let trie = self.base.trie(idx)?;
        match format {
            PinyinDictFormat::Binary => {
                writer.write_all(DICT_MAGIC)?;
                writer.write_u32::<LittleEndian>(DICT_VERSION)?;
                trie.save(writer)
            }
            PinyinDictFormat::Text => {
                let mut result = Ok(());
                trie.foreach(|cost, len, state| {
                    let key = trie.suffix(state, len);
                    if let Some(sep) = key.iter().position(|&b| b == CODE_SEPARATOR) {
                        let pinyin = match PinyinEncoder::decode_full_pinyin(&key[..sep]) {
                            Ok(p) => p,
                            Err(_) => return true,
                        };
                        if let Ok(word) = std::str::from_utf8(&key[sep + 1..]) {
                            if let Err(e) = writeln!(writer, "{word} {pinyin} {cost}") {
                                result = Err(Error::Io(e));
                                return false;
                            }
                        }
                    }
                    true
                });
                result
            }
        }
    }

    fn extend_result(
        trie: &DatTrie<f32>,
        source: &MatchResult,
        readings: &SyllableReadings,
    ) -> MatchResult {
        let mut out = MatchResult {
            layer: source.layer,
            size: source.size + 2,
            pos: Vec::new(),
        };
        for entry in &source.pos {
            for (initial, finals) in readings {
                if *initial == PinyinInitial::Invalid {
                    continue;
                }
                let ini_b = *initial as u8;
                let mut after_initial = entry.trie_pos;
                if !trie.traverse(&[ini_b], &mut after_initial).is_path() {
                    continue;
                }
                for &(fin, is_fuzzy) in finals {
                    let fuzzy_penalty = if is_fuzzy { FUZZY_COST } else { 0.0 };
                    if fin == PinyinFinal::Invalid || fin == PinyinFinal::Zero {
                        // Initial-only: fan out over every final valid with
                        // this initial.
                        for fb in PinyinFinal::FIRST..=PinyinFinal::LAST_CONCRETE {
                            let candidate = PinyinFinal::from_byte(fb);
                            if !crate::data::is_valid_initial_final(*initial, candidate) {
                                continue;
                            }
                            let mut p = after_initial;
                            if trie.traverse(&[fb], &mut p).is_path() {
                                let mut code = entry.code.clone();
                                code.extend_from_slice(&[ini_b, fb]);
                                out.pos.push(PosEntry {
                                    trie_pos: p,
                                    code,
                                    penalty: entry.penalty + fuzzy_penalty + WILDCARD_COST,
                                });
                            }
                        }
                    } else {
                        let mut p = after_initial;
                        if trie.traverse(&[fin as u8], &mut p).is_path() {
                            let mut code = entry.code.clone();
                            code.extend_from_slice(&[ini_b, fin as u8]);
                            out.pos.push(PosEntry {
                                trie_pos: p,
                                code,
                                penalty: entry.penalty + fuzzy_penalty,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    fn collect_items(trie: &DatTrie<f32>, result: &MatchResult) -> Vec<MatchItem> {
        let mut items = Vec::new();
        for entry in &result.pos {
            let mut p = entry.trie_pos;
            if !trie.traverse(&[CODE_SEPARATOR], &mut p).is_path() {
                continue;
            }
            trie.foreach_at(p, |cost, len, state| {
                let word_bytes = trie.suffix(state, len);
                if let Ok(word) = std::str::from_utf8(&word_bytes) {
                    items.push(MatchItem {
                        word: word.to_string(),
                        cost: cost + entry.penalty,
                        encoded: entry.code.clone(),
                    });
                }
                true
            });
        }
        items
    }

    fn segment_readings(
        state: &PinyinMatchState,
        segment: &str,
        flags: FuzzyFlags,
    ) -> SyllableReadings {
        match state.shuangpin() {
            Some(profile) => profile.readings(segment, flags),
            None => PinyinEncoder::string_to_syllables(segment, flags),
        }
    }

    /// Cache key of a walk: its segment texts with explicit boundaries.
    /// The same byte span can cut into different syllables (inner
    /// segmentation), so the covered text alone would collide.
    fn walk_key(
        graph: &SegmentGraph,
        path: &[SegmentGraphNodeId],
        v_off: usize,
    ) -> Option<String> {
        let mut key = String::new();
        let mut prev = graph.offset_of(path[0])?;
        for &node in &path[1..] {
            let off = graph.offset_of(node)?;
            key.push_str(&graph.data()[prev..off]);
            key.push('|');
            prev = off;
        }
        key.push_str(&graph.data()[prev..v_off]);
        key.push('|');
        Some(key)
    }
}

impl Dictionary for PinyinDictionary {
    type MatchHelper = PinyinMatchState;

    fn match_prefix(
        &self,
        graph: &SegmentGraph,
        helper: Option<&mut PinyinMatchState>,
        cb: &mut dyn FnMut(&[SegmentGraphNodeId], WordNode, f32, LatticeNodeData),
    ) {
        let mut local = PinyinMatchState::new(FuzzyFlags::NONE);
        let state = match helper {
            Some(h) => h,
            None => &mut local,
        };
        let layer_count = self.base.dict_size();
        state.ensure_layers(layer_count);
        let flags = state.flags();

        let mut in_edges: AHashMap<usize, Vec<usize>> = AHashMap::new();
        for node in graph.iter() {
            for &to in node.next() {
                in_edges.entry(to).or_default().push(node.index());
            }
        }

        // Fresh per-layer root walks; cloned for every word start.
        let roots: Vec<Rc<MatchResult>> = (0..layer_count)
            .map(|layer| {
                Rc::new(MatchResult {
                    layer,
                    size: 0,
                    pos: vec![PosEntry {
                        trie_pos: DatTrie::<f32>::root_pos(),
                        code: Vec::new(),
                        penalty: 0.0,
                    }],
                })
            })
            .collect();

        let offsets: Vec<usize> = graph.iter().map(|n| n.index()).collect();
        for v_off in offsets {
            if v_off == 0 {
                continue;
            }
            let v_id = match graph.node_at(v_off) {
                Some(n) => n.id(),
                None => continue,
            };
            if state.search.contains_key(&v_id) {
                continue;
            }
            let mut edges_here: Vec<TrieEdge> = Vec::new();
            let froms = in_edges.get(&v_off).cloned().unwrap_or_default();
            for u_off in froms {
                let u_id = match graph.node_at(u_off) {
                    Some(n) => n.id(),
                    None => continue,
                };
                let segment = graph.segment(u_off, v_off);

                // Separator edges forward walks without consuming code.
                if segment.bytes().all(|b| b == b'\'') {
                    let sources = state.search.get(&u_id).cloned().unwrap_or_default();
                    for edge in sources {
                        let mut path = edge.path.clone();
                        path.push(v_id);
                        edges_here.push(TrieEdge {
                            result: edge.result,
                            path,
                        });
                    }
                    continue;
                }

                let readings = Self::segment_readings(state, segment, flags);
                let mut sources: Vec<TrieEdge> =
                    state.search.get(&u_id).cloned().unwrap_or_default();
                for root in &roots {
                    sources.push(TrieEdge {
                        result: Rc::clone(root),
                        path: vec![u_id],
                    });
                }

                for source in sources {
                    let layer = source.result.layer;
                    let trie = match self.base.trie(layer) {
                        Ok(t) => t,
                        Err(_) => continue,
                    };
                    let key = match Self::walk_key(graph, &source.path, v_off) {
                        Some(k) => k,
                        None => continue,
                    };

                    let cached = state.node_cache[layer].find(key.as_str()).cloned();
                    let result = match cached {
                        Some(hit) => hit,
                        None => {
                            let fresh =
                                Rc::new(Self::extend_result(trie, &source.result, &readings));
                            state.node_cache[layer].insert(key.clone(), Rc::clone(&fresh));
                            fresh
                        }
                    };
                    if result.pos.is_empty() {
                        continue;
                    }

                    let cached = state.match_cache[layer].find(key.as_str()).cloned();
                    let items = match cached {
                        Some(hit) => hit,
                        None => {
                            let fresh = Rc::new(Self::collect_items(trie, &result));
                            state.match_cache[layer].insert(key.clone(), Rc::clone(&fresh));
                            fresh
                        }
                    };

                    let mut path = source.path.clone();
                    path.push(v_id);
                    for item in items.iter() {
                        cb(
                            &path,
                            WordNode::new(item.word.as_str(), UNKNOWN_WORD),
                            item.cost,
                            LatticeNodeData::pinyin(item.encoded.clone()),
                        );
                    }
                    edges_here.push(TrieEdge { result, path });
                }
            }
            state.search.insert(v_id, edges_here);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libshuru_core::{SYSTEM_DICT, USER_DICT};
    use std::io::Cursor;

    fn sample_dict() -> PinyinDictionary {
        let mut dict = PinyinDictionary::new();
        let text = "你好 ni'hao 0.0\n你 ni -0.3\n好 hao -0.3\n泥 ni -1.0\n耗 hao -1.0\n香 xiang -0.5\n";
        dict.load(
            SYSTEM_DICT,
            &mut Cursor::new(text.as_bytes()),
            PinyinDictFormat::Text,
        )
        .unwrap();
        dict
    }

    fn encoded(pinyin: &str) -> Vec<u8> {
        PinyinEncoder::encode_full_pinyin(pinyin).unwrap()
    }

    #[test]
    fn test_match_words_exact() {
        let dict = sample_dict();
        let mut found = Vec::new();
        dict.match_words(&encoded("ni'hao"), &mut |code, word, cost| {
            found.push((
                PinyinEncoder::decode_full_pinyin(code).unwrap(),
                word.to_string(),
                cost,
            ));
            true
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "ni'hao");
        assert_eq!(found[0].1, "你好");
    }

    #[test]
    fn test_match_words_prefix() {
        let dict = sample_dict();
        let mut words = Vec::new();
        dict.match_words_prefix(&encoded("ni"), &mut |_, word, _| {
            words.push(word.to_string());
            true
        });
        assert!(words.contains(&"你".to_string()));
        assert!(words.contains(&"泥".to_string()));
        assert!(words.contains(&"你好".to_string()));
        assert!(!words.contains(&"好".to_string()));
    }

    #[test]
    fn test_user_dict_layering() {
        let mut dict = sample_dict();
        dict.add_full_pinyin_word(USER_DICT, "倪", "ni", -0.2).unwrap();
        let mut words = Vec::new();
        dict.match_words(&encoded("ni"), &mut |_, word, _| {
            words.push(word.to_string());
            true
        });
        assert!(words.contains(&"倪".to_string()));

        assert!(dict.remove_word(USER_DICT, "ni", "倪").unwrap());
        let mut words = Vec::new();
        dict.match_words(&encoded("ni"), &mut |_, word, _| {
            words.push(word.to_string());
            true
        });
        assert!(!words.contains(&"倪".to_string()));
        // System entries are untouched.
        assert!(words.contains(&"你".to_string()));
    }

    #[test]
    fn test_remove_user_layer_is_rejected() {
        let mut dict = sample_dict();
        assert!(matches!(
            dict.remove(USER_DICT),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_binary_roundtrip() {
        let dict = sample_dict();
        let mut image = Vec::new();
        dict.save(SYSTEM_DICT, &mut image, PinyinDictFormat::Binary)
            .unwrap();

        let mut reloaded = PinyinDictionary::new();
        reloaded
            .load(
                SYSTEM_DICT,
                &mut Cursor::new(&image),
                PinyinDictFormat::Binary,
            )
            .unwrap();
        let mut found = false;
        reloaded.match_words(&encoded("ni'hao"), &mut |_, word, _| {
            found |= word == "你好";
            true
        });
        assert!(found);
    }

    #[test]
    fn test_text_save_roundtrip() {
        let dict = sample_dict();
        let mut text = Vec::new();
        dict.save(SYSTEM_DICT, &mut text, PinyinDictFormat::Text)
            .unwrap();
        let mut reloaded = PinyinDictionary::new();
        reloaded
            .load(
                SYSTEM_DICT,
                &mut Cursor::new(&text),
                PinyinDictFormat::Text,
            )
            .unwrap();
        let mut count = 0;
        reloaded.match_words_prefix(&[], &mut |_, _, _| {
            count += 1;
            true
        });
        assert_eq!(count, 6);
    }

    fn collect_graph_matches(
        dict: &PinyinDictionary,
        input: &str,
        flags: FuzzyFlags,
    ) -> Vec<(String, f32)> {
        let graph = PinyinEncoder::parse_user_pinyin(input, flags);
        let mut state = PinyinMatchState::new(flags);
        let mut out = Vec::new();
        dict.match_prefix(&graph, Some(&mut state), &mut |_, word, cost, _| {
            out.push((word.word().to_string(), cost));
        });
        out
    }

    #[test]
    fn test_match_prefix_over_graph() {
        let dict = sample_dict();
        let words = collect_graph_matches(&dict, "nihao", FuzzyFlags::NONE);
        let names: Vec<&str> = words.iter().map(|(w, _)| w.as_str()).collect();
        assert!(names.contains(&"你"));
        assert!(names.contains(&"好"));
        assert!(names.contains(&"你好"));
        assert!(names.contains(&"泥"));
    }

    #[test]
    fn test_match_prefix_spans_separator() {
        let dict = sample_dict();
        let words = collect_graph_matches(&dict, "ni'hao", FuzzyFlags::NONE);
        let names: Vec<&str> = words.iter().map(|(w, _)| w.as_str()).collect();
        assert!(names.contains(&"你好"));
    }

    #[test]
    fn test_wildcard_final_is_penalized() {
        let dict = sample_dict();
        let words = collect_graph_matches(&dict, "n", FuzzyFlags::NONE);
        let ni = words.iter().find(|(w, _)| w == "你").expect("wildcard match");
        // -0.3 stored cost plus the wildcard penalty.
        assert!((ni.1 - (-0.3 + WILDCARD_COST)).abs() < 1e-4);
    }

    #[test]
    fn test_fuzzy_match_has_fuzzy_cost() {
        let mut dict = PinyinDictionary::new();
        dict.add_full_pinyin_word(SYSTEM_DICT, "张", "zhang", 0.0)
            .unwrap();
        // Typed with the flat initial; only matches under z<->zh.
        assert!(collect_graph_matches(&dict, "zang", FuzzyFlags::NONE).is_empty());
        let words = collect_graph_matches(&dict, "zang", FuzzyFlags::Z_ZH);
        let zhang = words.iter().find(|(w, _)| w == "张").expect("fuzzy match");
        assert!((zhang.1 - FUZZY_COST).abs() < 1e-4);
    }

    #[test]
    fn test_incremental_match_reuses_nodes() {
        let dict = sample_dict();
        let flags = FuzzyFlags::NONE;
        let mut state = PinyinMatchState::new(flags);

        let mut graph = PinyinEncoder::parse_user_pinyin("ni", flags);
        dict.match_prefix(&graph, Some(&mut state), &mut |_, _, _, _| {});

        let next = PinyinEncoder::parse_user_pinyin("nihao", flags);
        let since = graph.check(&next);
        let removed: ahash::AHashSet<_> = graph.merge(next, since).into_iter().collect();
        state.discard_node(&removed);

        let mut words = Vec::new();
        dict.match_prefix(&graph, Some(&mut state), &mut |_, word, _, _| {
            words.push(word.word().to_string());
        });
        // Only nodes invalidated by the edit are re-matched, and the
        // multi-syllable word still spans from the preserved prefix.
        assert!(words.contains(&"你好".to_string()));
        assert!(words.contains(&"好".to_string()));
    }
}

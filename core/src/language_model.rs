//! Back-off n-gram language model.
//!
//! Scores are base-10 log probabilities throughout. The model keeps a
//! vocabulary with three reserved indices (unknown, begin-of-sentence,
//! end-of-sentence), unigram log-probs, per-context back-off weights and a
//! bigram table. The scoring context travels in an opaque fixed-length
//! [`State`] so callers never see the model internals; wrapping models (the
//! user model) extend the state with their own trailing bytes.
//!
//! The on-disk artifact is a 4-byte magic followed by a bincode image;
//! loading a mismatched magic or truncated stream fails with
//! `InvalidFormat`.

use std::io::{Read, Write};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lattice::WordNode;

pub type WordIndex = u32;

/// Reserved vocabulary slots.
pub const UNKNOWN_WORD: WordIndex = 0;
pub const BOS_WORD: WordIndex = 1;
pub const EOS_WORD: WordIndex = 2;
const RESERVED_WORDS: usize = 3;

/// Opaque scoring context. Length is fixed per model.
pub type State = Vec<u8>;

const NULL_CONTEXT: u32 = u32::MAX;
/// Fixed state length of the base model: one LE u32 context word.
pub const BASE_STATE_SIZE: usize = 4;

const MODEL_MAGIC: &[u8; 4] = b"SLM\x01";
/// Default back-off weight, log10(0.4).
const BACKOFF_DEFAULT: f32 = -0.39794;

fn encode_context(state: &mut State, ctx: u32) {
    state.resize(BASE_STATE_SIZE, 0);
    state[..4].copy_from_slice(&ctx.to_le_bytes());
}

fn decode_context(state: &[u8]) -> u32 {
    if state.len() < 4 {
        return NULL_CONTEXT;
    }
    u32::from_le_bytes([state[0], state[1], state[2], state[3]])
}

/// Scoring interface shared by the static model and the user model.
pub trait LanguageModelBase {
    fn begin_sentence(&self) -> WordIndex;
    fn end_sentence(&self) -> WordIndex;
    fn unknown(&self) -> WordIndex;
    fn begin_state(&self) -> State;
    fn null_state(&self) -> State;
    fn index(&self, word: &str) -> WordIndex;

    /// Score `word` after `state`, writing the successor context to `out`.
    fn score(&self, state: &[u8], word: &WordNode, out: &mut State) -> f32;

    /// Most likely continuations of `state`, best first, with their scores.
    fn predict(&self, state: &[u8], max: usize) -> Vec<(String, f32)>;

    /// Accumulate a word sequence from `state`.
    fn words_score(&self, state: &[u8], words: &[WordNode]) -> f32 {
        let mut cur = state.to_vec();
        let mut out = State::new();
        let mut total = 0.0;
        for word in words {
            total += self.score(&cur, word, &mut out);
            std::mem::swap(&mut cur, &mut out);
        }
        total
    }

    /// Score one word without committing the successor state.
    fn single_word_score(&self, state: &[u8], word: &str) -> f32 {
        let node = WordNode::new(word, self.index(word));
        let mut out = State::new();
        self.score(state, &node, &mut out)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelImage {
    words: Vec<String>,
    unigram: Vec<f32>,
    backoff: Vec<f32>,
    bigrams: Vec<(u32, u32, f32)>,
    unk_logp: f32,
}

#[derive(Debug)]
pub struct LanguageModel {
    words: Vec<String>,
    index: AHashMap<String, WordIndex>,
    unigram: Vec<f32>,
    backoff: Vec<f32>,
    /// context word -> (successor word, log10 p) sorted by successor index.
    succ: AHashMap<u32, Vec<(u32, f32)>>,
    unk_logp: f32,
}

impl LanguageModel {
    fn from_image(image: ModelImage) -> Result<Self> {
        let n = image.words.len();
        if n < RESERVED_WORDS || image.unigram.len() != n || image.backoff.len() != n {
            return Err(Error::invalid_format("language model table length mismatch"));
        }
        let mut index = AHashMap::with_capacity(n);
        for (i, w) in image.words.iter().enumerate() {
            index.insert(w.clone(), i as WordIndex);
        }
        let mut succ: AHashMap<u32, Vec<(u32, f32)>> = AHashMap::new();
        for (w1, w2, logp) in image.bigrams {
            if w1 as usize >= n || w2 as usize >= n {
                return Err(Error::invalid_format("language model bigram out of vocabulary"));
            }
            succ.entry(w1).or_default().push((w2, logp));
        }
        for list in succ.values_mut() {
            list.sort_by_key(|&(w, _)| w);
        }
        Ok(Self {
            words: image.words,
            index,
            unigram: image.unigram,
            backoff: image.backoff,
            succ,
            unk_logp: image.unk_logp,
        })
    }

    pub fn load<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::invalid_format("truncated language model")
            } else {
                Error::Io(e)
            }
        })?;
        if &magic != MODEL_MAGIC {
            return Err(Error::invalid_format("bad language model magic"));
        }
        let image: ModelImage = bincode::deserialize_from(reader)
            .map_err(|e| Error::invalid_format(format!("language model image: {e}")))?;
        Self::from_image(image)
    }

    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(MODEL_MAGIC)?;
        let mut bigrams = Vec::new();
        for (&w1, list) in &self.succ {
            for &(w2, logp) in list {
                bigrams.push((w1, w2, logp));
            }
        }
        bigrams.sort_unstable_by_key(|&(a, b, _)| (a, b));
        let image = ModelImage {
            words: self.words.clone(),
            unigram: self.unigram.clone(),
            backoff: self.backoff.clone(),
            bigrams,
            unk_logp: self.unk_logp,
        };
        bincode::serialize_into(writer, &image)
            .map_err(|e| Error::invalid_format(format!("language model image: {e}")))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.words.len()
    }

    pub fn word(&self, idx: WordIndex) -> Option<&str> {
        self.words.get(idx as usize).map(|s| s.as_str())
    }

    fn bigram(&self, ctx: u32, word: u32) -> Option<f32> {
        let list = self.succ.get(&ctx)?;
        list.binary_search_by_key(&word, |&(w, _)| w)
            .ok()
            .map(|i| list[i].1)
    }
}

impl LanguageModelBase for LanguageModel {
    fn begin_sentence(&self) -> WordIndex {
        BOS_WORD
    }

    fn end_sentence(&self) -> WordIndex {
        EOS_WORD
    }

    fn unknown(&self) -> WordIndex {
        UNKNOWN_WORD
    }

    fn begin_state(&self) -> State {
        let mut state = State::new();
        encode_context(&mut state, BOS_WORD);
        state
    }

    fn null_state(&self) -> State {
        let mut state = State::new();
        encode_context(&mut state, NULL_CONTEXT);
        state
    }

    fn index(&self, word: &str) -> WordIndex {
        self.index.get(word).copied().unwrap_or(UNKNOWN_WORD)
    }

    fn score(&self, state: &[u8], word: &WordNode, out: &mut State) -> f32 {
        let ctx = decode_context(state);
        let idx = if word.idx() != UNKNOWN_WORD {
            word.idx()
        } else {
            self.index(word.word())
        };
        let logp = if idx == UNKNOWN_WORD {
            self.unk_logp
        } else if ctx != NULL_CONTEXT && (ctx as usize) < self.words.len() {
            match self.bigram(ctx, idx) {
                Some(p) => p,
                None => self.backoff[ctx as usize] + self.unigram[idx as usize],
            }
        } else {
            self.unigram[idx as usize]
        };
        let next_ctx = if idx == UNKNOWN_WORD { NULL_CONTEXT } else { idx };
        encode_context(out, next_ctx);
        logp
    }

    fn predict(&self, state: &[u8], max: usize) -> Vec<(String, f32)> {
        let ctx = decode_context(state);
        if ctx == NULL_CONTEXT {
            return Vec::new();
        }
        let mut out: Vec<(String, f32)> = self
            .succ
            .get(&ctx)
            .map(|list| {
                list.iter()
                    .filter(|&&(w, _)| w as usize >= RESERVED_WORDS)
                    .map(|&(w, logp)| (self.words[w as usize].clone(), logp))
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if max > 0 && out.len() > max {
            out.truncate(max);
        }
        out
    }
}

/// Builds a model from raw counts; used by tests and data converters.
#[derive(Debug, Default)]
pub struct LanguageModelBuilder {
    unigram_counts: AHashMap<String, u64>,
    bigram_counts: AHashMap<(String, String), u64>,
    sentence_count: u64,
}

impl LanguageModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_word_count(&mut self, word: impl Into<String>, count: u64) -> &mut Self {
        *self.unigram_counts.entry(word.into()).or_insert(0) += count;
        self
    }

    pub fn add_bigram_count(
        &mut self,
        w1: impl Into<String>,
        w2: impl Into<String>,
        count: u64,
    ) -> &mut Self {
        *self
            .bigram_counts
            .entry((w1.into(), w2.into()))
            .or_insert(0) += count;
        self
    }

    /// Count a whole sentence, including the BOS/EOS transitions.
    pub fn add_sentence(&mut self, words: &[&str]) -> &mut Self {
        self.sentence_count += 1;
        let mut prev: Option<&str> = None;
        for &w in words {
            self.add_word_count(w, 1);
            match prev {
                Some(p) => {
                    self.add_bigram_count(p, w, 1);
                }
                None => {
                    *self
                        .bigram_counts
                        .entry(("<s>".to_string(), w.to_string()))
                        .or_insert(0) += 1;
                }
            }
            prev = Some(w);
        }
        if let Some(p) = prev {
            *self
                .bigram_counts
                .entry((p.to_string(), "</s>".to_string()))
                .or_insert(0) += 1;
        }
        self
    }

    pub fn build(&self) -> LanguageModel {
        let mut words = vec!["<unk>".to_string(), "<s>".to_string(), "</s>".to_string()];
        let mut vocab: Vec<&String> = self.unigram_counts.keys().collect();
        vocab.sort();
        words.extend(vocab.iter().map(|w| (*w).to_string()));

        let mut index = AHashMap::with_capacity(words.len());
        for (i, w) in words.iter().enumerate() {
            index.insert(w.clone(), i as WordIndex);
        }

        let total: u64 = self.unigram_counts.values().sum::<u64>().max(1);
        let mut unigram = vec![0.0f32; words.len()];
        for (w, &c) in &self.unigram_counts {
            let idx = index[w] as usize;
            unigram[idx] = ((c as f64) / (total as f64)).log10() as f32;
        }
        // Two decades below a singleton word.
        let unk_logp = (1.0 / (total as f64)).log10() as f32 - 2.0;

        let mut succ: AHashMap<u32, Vec<(u32, f32)>> = AHashMap::new();
        for ((w1, w2), &c12) in &self.bigram_counts {
            let i1 = match index.get(w1) {
                Some(&i) => i,
                None => continue,
            };
            let i2 = match index.get(w2) {
                Some(&i) => i,
                None => continue,
            };
            let c1 = if i1 == BOS_WORD {
                self.sentence_count.max(1)
            } else {
                self.unigram_counts.get(w1).copied().unwrap_or(1).max(1)
            };
            let logp = ((c12 as f64) / (c1 as f64)).log10() as f32;
            succ.entry(i1).or_default().push((i2, logp));
        }
        for list in succ.values_mut() {
            list.sort_by_key(|&(w, _)| w);
        }

        let backoff = vec![BACKOFF_DEFAULT; words.len()];
        LanguageModel {
            index,
            unigram,
            backoff,
            succ,
            unk_logp,
            words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny_model() -> LanguageModel {
        let mut builder = LanguageModelBuilder::new();
        builder.add_sentence(&["你好", "世界"]);
        builder.add_sentence(&["你好", "朋友"]);
        builder.add_word_count("泥耗", 1);
        builder.add_word_count("你好", 10);
        builder.build()
    }

    #[test]
    fn test_reserved_indices() {
        let lm = tiny_model();
        assert_eq!(lm.unknown(), UNKNOWN_WORD);
        assert_eq!(lm.begin_sentence(), BOS_WORD);
        assert_eq!(lm.end_sentence(), EOS_WORD);
        assert_eq!(lm.index("不存在"), UNKNOWN_WORD);
        assert_ne!(lm.index("你好"), UNKNOWN_WORD);
    }

    #[test]
    fn test_frequent_word_scores_higher() {
        let lm = tiny_model();
        let null = lm.null_state();
        let good = lm.single_word_score(&null, "你好");
        let bad = lm.single_word_score(&null, "泥耗");
        assert!(good > bad, "{good} vs {bad}");
    }

    #[test]
    fn test_bigram_beats_backoff() {
        let lm = tiny_model();
        let mut state = lm.begin_state();
        let node = WordNode::new("你好", lm.index("你好"));
        let mut out = State::new();
        lm.score(&state, &node, &mut out);
        state = out.clone();
        // 世界 was seen after 你好; 泥耗 was not.
        let seen = lm.single_word_score(&state, "世界");
        let unseen = lm.single_word_score(&state, "泥耗");
        assert!(seen > unseen);
    }

    #[test]
    fn test_state_is_fixed_length() {
        let lm = tiny_model();
        assert_eq!(lm.begin_state().len(), BASE_STATE_SIZE);
        assert_eq!(lm.null_state().len(), BASE_STATE_SIZE);
        let mut out = State::new();
        lm.score(&lm.begin_state(), &WordNode::new("你好", lm.index("你好")), &mut out);
        assert_eq!(out.len(), BASE_STATE_SIZE);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let lm = tiny_model();
        let mut image = Vec::new();
        lm.save(&mut image).unwrap();
        let loaded = LanguageModel::load(&mut Cursor::new(&image)).unwrap();
        let null = lm.null_state();
        assert_eq!(
            lm.single_word_score(&null, "你好"),
            loaded.single_word_score(&null, "你好")
        );
    }

    #[test]
    fn test_bad_magic_is_invalid_format() {
        let data = b"NOPE else entirely";
        match LanguageModel::load(&mut Cursor::new(&data[..])) {
            Err(Error::InvalidFormat(_)) => {}
            other => panic!("expected InvalidFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_predict_orders_by_score() {
        let mut builder = LanguageModelBuilder::new();
        builder.add_sentence(&["中国", "国庆"]);
        builder.add_sentence(&["中国", "国庆"]);
        builder.add_sentence(&["中国", "人民"]);
        let lm = builder.build();
        let state = lm.null_state();
        let mut out = State::new();
        lm.score(&state, &WordNode::new("中国", lm.index("中国")), &mut out);
        let predictions = lm.predict(&out, 5);
        assert!(!predictions.is_empty());
        assert_eq!(predictions[0].0, "国庆");
    }
}

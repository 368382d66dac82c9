//! Online-learned history bigram.
//!
//! Committed sentences flow into a "recent" pool; when it overflows, the
//! oldest sentence is promoted to the "middle" pool, and from there to the
//! "long" pool, where it eventually falls off. Each pool keeps unigram and
//! bigram counts of its sentences; scoring mixes the pools by weight, so a
//! phrase the user just typed outweighs one typed months ago even if the
//! old one has more raw occurrences.
//!
//! The save format is a plain text stream, one sentence per line,
//! whitespace-separated words, most recent first.

use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Capacity (in sentences) and mixing weight of one pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolParam {
    pub size: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub recent: PoolParam,
    pub middle: PoolParam,
    pub long_term: PoolParam,
    /// log10 probability floor added to every score.
    pub unknown_penalty: f32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            recent: PoolParam {
                size: 128,
                weight: 0.8,
            },
            middle: PoolParam {
                size: 8192,
                weight: 0.15,
            },
            long_term: PoolParam {
                size: 65536,
                weight: 0.05,
            },
            unknown_penalty: (1.0f32 / 8192.0).log10(),
        }
    }
}

/// Within-pool mixing of the bigram and unigram estimates.
const BIGRAM_SHARE: f64 = 0.8;

#[derive(Debug, Default, Clone)]
struct Pool {
    max_size: usize,
    weight: f32,
    /// Front = newest.
    sentences: VecDeque<Vec<String>>,
    unigram: HashMap<String, u32>,
    bigram: HashMap<String, HashMap<String, u32>>,
    word_total: u64,
}

impl Pool {
    fn new(param: PoolParam) -> Self {
        Self {
            max_size: param.size,
            weight: param.weight,
            ..Default::default()
        }
    }

    fn add_counts(&mut self, sentence: &[String]) {
        for w in sentence {
            *self.unigram.entry(w.clone()).or_insert(0) += 1;
            self.word_total += 1;
        }
        for pair in sentence.windows(2) {
            *self
                .bigram
                .entry(pair[0].clone())
                .or_default()
                .entry(pair[1].clone())
                .or_insert(0) += 1;
        }
    }

    fn remove_counts(&mut self, sentence: &[String]) {
        for w in sentence {
            if let Some(c) = self.unigram.get_mut(w) {
                *c -= 1;
                if *c == 0 {
                    self.unigram.remove(w);
                }
            }
            self.word_total = self.word_total.saturating_sub(1);
        }
        for pair in sentence.windows(2) {
            if let Some(succ) = self.bigram.get_mut(&pair[0]) {
                if let Some(c) = succ.get_mut(&pair[1]) {
                    *c -= 1;
                    if *c == 0 {
                        succ.remove(&pair[1]);
                    }
                }
                if succ.is_empty() {
                    self.bigram.remove(&pair[0]);
                }
            }
        }
    }

    /// Push as newest; returns the evicted oldest sentence on overflow.
    fn push(&mut self, sentence: Vec<String>) -> Option<Vec<String>> {
        self.add_counts(&sentence);
        self.sentences.push_front(sentence);
        if self.sentences.len() > self.max_size {
            let oldest = self.sentences.pop_back()?;
            self.remove_counts(&oldest);
            return Some(oldest);
        }
        None
    }

    fn unigram_freq(&self, word: &str) -> u32 {
        self.unigram.get(word).copied().unwrap_or(0)
    }

    fn bigram_freq(&self, prev: &str, word: &str) -> u32 {
        self.bigram
            .get(prev)
            .and_then(|succ| succ.get(word))
            .copied()
            .unwrap_or(0)
    }

    /// Smoothed in-pool probability of `word` after `prev`.
    fn prob(&self, prev: Option<&str>, word: &str) -> f64 {
        if self.word_total == 0 {
            return 0.0;
        }
        let pu = self.unigram_freq(word) as f64 / self.word_total as f64;
        match prev {
            Some(p) if !p.is_empty() => {
                let cp = self.unigram_freq(p);
                if cp == 0 {
                    return pu;
                }
                let pb = self.bigram_freq(p, word) as f64 / cp as f64;
                BIGRAM_SHARE * pb + (1.0 - BIGRAM_SHARE) * pu
            }
            _ => pu,
        }
    }

    fn clear(&mut self) {
        self.sentences.clear();
        self.unigram.clear();
        self.bigram.clear();
        self.word_total = 0;
    }
}

#[derive(Debug, Clone)]
pub struct HistoryBigram {
    config: HistoryConfig,
    recent: Pool,
    middle: Pool,
    long_term: Pool,
}

impl Default for HistoryBigram {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryBigram {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            recent: Pool::new(config.recent),
            middle: Pool::new(config.middle),
            long_term: Pool::new(config.long_term),
            config,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn set_unknown_penalty(&mut self, penalty: f32) {
        self.config.unknown_penalty = penalty;
    }

    fn pools(&self) -> [&Pool; 3] {
        [&self.recent, &self.middle, &self.long_term]
    }

    /// Record a committed sentence as the most recent history entry.
    pub fn add(&mut self, sentence: &[impl AsRef<str>]) {
        let words: Vec<String> = sentence
            .iter()
            .map(|w| w.as_ref().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return;
        }
        if let Some(evicted) = self.recent.push(words) {
            if let Some(evicted) = self.middle.push(evicted) {
                // Oldest long-term sentences fall off entirely.
                let _ = self.long_term.push(evicted);
            }
        }
    }

    /// Purge a word from every pool. Sentences containing it are split at
    /// the removed word so no false bigrams appear.
    pub fn forget(&mut self, word: &str) {
        for pool in [&mut self.recent, &mut self.middle, &mut self.long_term] {
            let old: Vec<Vec<String>> = pool.sentences.iter().cloned().collect();
            pool.clear();
            // Iterate oldest first so push() rebuilds the original order.
            for sentence in old.into_iter().rev() {
                for part in sentence.split(|w| w.as_str() == word) {
                    if !part.is_empty() {
                        let _ = pool.push(part.to_vec());
                    }
                }
            }
        }
    }

    pub fn is_unknown(&self, word: &str) -> bool {
        self.pools()
            .iter()
            .all(|pool| pool.unigram_freq(word) == 0)
    }

    /// log10 of the weighted pool mix plus the unknown floor.
    pub fn score(&self, prev: &str, word: &str) -> f32 {
        let prev = if prev.is_empty() { None } else { Some(prev) };
        let mut p = 0.0f64;
        for pool in self.pools() {
            p += pool.weight as f64 * pool.prob(prev, word);
        }
        let floor = 10f64.powf(self.config.unknown_penalty as f64);
        ((p + floor).log10()) as f32
    }

    /// Append up to `max` most-frequent continuations of the last prefix
    /// word (`max == 0` means unlimited). Entries already in `result` are
    /// skipped; ordering is frequency desc, pool recency, then text.
    pub fn fill_predict(&self, result: &mut Vec<String>, prefix: &[String], max: usize) {
        let last = match prefix.last() {
            Some(w) => w,
            None => return,
        };
        // word -> (total freq, index of the most recent pool mentioning it)
        let mut merged: HashMap<&str, (u64, usize)> = HashMap::new();
        for (pool_idx, pool) in self.pools().iter().enumerate() {
            if let Some(succ) = pool.bigram.get(last.as_str()) {
                for (word, &freq) in succ {
                    let entry = merged.entry(word.as_str()).or_insert((0, pool_idx));
                    entry.0 += freq as u64;
                    entry.1 = entry.1.min(pool_idx);
                }
            }
        }
        let mut ordered: Vec<(&str, u64, usize)> =
            merged.into_iter().map(|(w, (f, p))| (w, f, p)).collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)).then(a.0.cmp(b.0)));
        for (word, _, _) in ordered {
            if max > 0 && result.len() >= max {
                break;
            }
            if !result.iter().any(|w| w == word) {
                result.push(word.to_string());
            }
        }
    }

    pub fn clear(&mut self) {
        self.recent.clear();
        self.middle.clear();
        self.long_term.clear();
    }

    /// Dump all sentences, most recent first.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        for pool in self.pools() {
            for sentence in &pool.sentences {
                writeln!(writer, "{}", sentence.join(" "))?;
            }
        }
        Ok(())
    }

    /// Replace the current contents with a dump written by
    /// [`HistoryBigram::save`].
    pub fn load<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let mut lines = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line.map_err(|e| {
                if e.kind() == std::io::ErrorKind::InvalidData {
                    Error::invalid_format("history stream is not valid UTF-8")
                } else {
                    Error::Io(e)
                }
            })?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        self.clear();
        // The stream is most-recent-first; re-add oldest first.
        for line in lines.iter().rev() {
            let words: Vec<&str> = line.split_whitespace().collect();
            self.add(&words);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn history() -> HistoryBigram {
        let mut h = HistoryBigram::default();
        h.set_unknown_penalty((1.0f32 / 8192.0).log10());
        h
    }

    #[test]
    fn test_learning_is_monotone() {
        let mut h = history();
        let before = h.score("", "你好");
        h.add(&["你好"]);
        let after = h.score("", "你好");
        assert!(after > before);
    }

    #[test]
    fn test_bigram_context_helps() {
        let mut h = history();
        h.add(&["你", "是", "一个", "好人"]);
        h.add(&["我", "是", "一个", "坏人"]);
        let seen = h.score("你", "是");
        let unseen = h.score("他", "不是");
        assert!(seen > unseen);
    }

    #[test]
    fn test_forget() {
        let mut h = history();
        h.add(&["跑步", "起来"]);
        assert!(!h.is_unknown("跑步"));
        h.forget("跑步");
        assert!(h.is_unknown("跑步"));
        // The other word survives, the bigram does not.
        assert!(!h.is_unknown("起来"));
        assert_eq!(h.recent.bigram_freq("跑步", "起来"), 0);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut h = history();
        h.add(&["你", "是", "好人"]);
        h.add(&["我", "是", "坏人"]);
        let before = h.score("你", "是");

        let mut dump = Vec::new();
        h.save(&mut dump).unwrap();
        // Most recent sentence comes first.
        let text = String::from_utf8(dump.clone()).unwrap();
        assert!(text.starts_with("我 是 坏人"));

        let mut reloaded = history();
        reloaded.load(&mut Cursor::new(&dump)).unwrap();
        let after = reloaded.score("你", "是");
        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn test_overflow_promotes_to_older_pools() {
        let mut h = HistoryBigram::new(HistoryConfig {
            recent: PoolParam {
                size: 2,
                weight: 0.8,
            },
            middle: PoolParam {
                size: 2,
                weight: 0.15,
            },
            long_term: PoolParam {
                size: 2,
                weight: 0.05,
            },
            unknown_penalty: (1.0f32 / 8192.0).log10(),
        });
        for i in 0..8 {
            h.add(&[format!("w{i}")]);
        }
        // Two newest stay recent, next two middle, next two long-term,
        // oldest two dropped.
        assert_eq!(h.recent.sentences.len(), 2);
        assert_eq!(h.middle.sentences.len(), 2);
        assert_eq!(h.long_term.sentences.len(), 2);
        assert!(h.is_unknown("w0"));
        assert!(h.is_unknown("w1"));
        assert!(!h.is_unknown("w7"));

        let mut dump = Vec::new();
        h.save(&mut dump).unwrap();
        let lines: Vec<String> = String::from_utf8(dump)
            .unwrap()
            .lines()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(lines, vec!["w7", "w6", "w5", "w4", "w3", "w2"]);
    }

    #[test]
    fn test_fill_predict() {
        let mut h = history();
        h.add(&["5", "6"]);
        h.add(&["5", "6"]);
        h.add(&["5", "7"]);
        let mut result = Vec::new();
        h.fill_predict(&mut result, &["5".to_string()], 0);
        assert_eq!(result, vec!["6".to_string(), "7".to_string()]);

        let mut capped = Vec::new();
        h.fill_predict(&mut capped, &["5".to_string()], 1);
        assert_eq!(capped, vec!["6".to_string()]);
    }

    #[test]
    fn test_recency_outweighs_frequency() {
        let mut h = HistoryBigram::new(HistoryConfig {
            recent: PoolParam {
                size: 2,
                weight: 0.8,
            },
            middle: PoolParam {
                size: 64,
                weight: 0.15,
            },
            long_term: PoolParam {
                size: 64,
                weight: 0.05,
            },
            unknown_penalty: (1.0f32 / 8192.0).log10(),
        });
        for _ in 0..10 {
            h.add(&["泥浩"]);
        }
        // Push 泥浩 out of the recent pool.
        h.add(&["你好"]);
        h.add(&["你好"]);
        assert!(h.score("", "你好") > h.score("", "泥浩"));
    }
}

//! Editing context for table input.
//!
//! The same shape as the pinyin context, minus what table input does not
//! need: codes are unambiguous, so there is no fuzzy matching and no
//! per-node match cache — every edit re-segments the remaining code and
//! decodes a fresh lattice, which is cheap at table input lengths.
//! Selecting a candidate moves its words into the ledger; `learn` feeds
//! the history bigram and, when auto-learning is on, records committed
//! multi-word phrases under their concatenated codes.

use std::rc::Rc;

use ahash::AHashSet;
use tracing::debug;

use libshuru_core::{
    DecodeParams, Decoder, Error, InputBuffer, Lattice, LanguageModelBase, Prediction, Result,
    SegmentGraph, SentenceResult, SentenceWord,
};

use crate::decoder::graph_for_code;
use crate::dict::TableFlag;
use crate::ime::TableIme;
use crate::options::TableLearning;

#[derive(Debug, Clone)]
struct Selection {
    words: Vec<SentenceWord>,
    /// Input bytes this selection consumed.
    length: usize,
}

pub struct TableContext {
    ime: Rc<TableIme>,
    buffer: InputBuffer,
    graph: SegmentGraph,
    lattice: Lattice,
    selected: Vec<Selection>,
    candidates: Vec<SentenceResult>,
}

impl TableContext {
    pub fn new(ime: Rc<TableIme>) -> Self {
        Self {
            buffer: InputBuffer::new(true),
            graph: SegmentGraph::new(String::new()),
            lattice: Lattice::new(),
            selected: Vec::new(),
            candidates: Vec::new(),
            ime,
        }
    }

    pub fn user_input(&self) -> &str {
        self.buffer.user_input()
    }

    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    pub fn size(&self) -> usize {
        self.buffer.size()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn candidates(&self) -> &[SentenceResult] {
        &self.candidates
    }

    /// True for keys this table accepts: the code alphabet plus the
    /// special marker keys.
    pub fn is_valid_input(&self, c: char) -> bool {
        let dict = self.ime.dict();
        let meta = dict.meta();
        meta.key_codes.contains(c)
            || meta.pinyin_key == Some(c)
            || meta.prompt_key == Some(c)
            || meta.construct_phrase_key == Some(c)
    }

    fn selected_bytes(&self) -> usize {
        self.selected.iter().map(|s| s.length).sum()
    }

    /// True once every typed byte is covered by selections.
    pub fn selected(&self) -> bool {
        !self.buffer.is_empty() && self.selected_bytes() >= self.buffer.user_input().len()
    }

    fn selected_text(&self) -> String {
        self.selected
            .iter()
            .flat_map(|s| s.words.iter())
            .map(|w| w.word.as_str())
            .collect()
    }

    /// The committed words in order.
    pub fn selected_words(&self) -> Vec<String> {
        self.selected
            .iter()
            .flat_map(|s| s.words.iter())
            .map(|w| w.word.clone())
            .collect()
    }

    /// Insert at the cursor and re-decode.
    pub fn type_str(&mut self, s: &str) -> Result<()> {
        self.buffer.type_str(s)?;
        self.update();
        Ok(())
    }

    /// Remove a codepoint range and re-decode.
    pub fn erase(&mut self, from: usize, to: usize) -> Result<()> {
        while self.selected_bytes() > from {
            if self.selected.pop().is_none() {
                break;
            }
        }
        self.buffer.erase(from, to)?;
        self.update();
        Ok(())
    }

    /// Delete before the cursor; cancels the last selection when the whole
    /// input is already selected.
    pub fn backspace(&mut self) -> bool {
        if self.selected() {
            return self.cancel();
        }
        if self.buffer.backspace() {
            self.update();
            true
        } else {
            false
        }
    }

    /// Move the cursor; selections past it are cancelled.
    pub fn set_cursor(&mut self, cursor: usize) -> Result<()> {
        self.buffer.set_cursor(cursor)?;
        while self.selected_bytes() > cursor {
            if self.selected.pop().is_none() {
                break;
            }
        }
        self.update();
        Ok(())
    }

    /// Commit candidate `i`: its words move to the selection ledger and
    /// the rest of the input is re-decoded.
    pub fn select(&mut self, i: usize) -> Result<()> {
        let candidate = self
            .candidates
            .get(i)
            .ok_or_else(|| Error::out_of_range(format!("no candidate {i}")))?
            .clone();
        let length = candidate.to_offset();
        if length == 0 {
            return Err(Error::invalid_argument("candidate covers no input"));
        }
        self.selected.push(Selection {
            words: candidate.words,
            length,
        });
        self.update();
        Ok(())
    }

    /// Undo the last selection.
    pub fn cancel(&mut self) -> bool {
        if self.selected.pop().is_some() {
            self.update();
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.selected.clear();
        self.candidates.clear();
        self.lattice.clear();
        self.graph = SegmentGraph::new(String::new());
    }

    /// Visible composition: committed words plus the raw rest.
    pub fn preedit(&self) -> String {
        let mut out = self.selected_text();
        out.push_str(&self.buffer.user_input()[self.selected_bytes()..]);
        out
    }

    /// Preedit plus the visual cursor's byte offset within it.
    pub fn preedit_with_cursor(&self) -> (String, usize) {
        let selected = self.selected_text();
        let selected_input = self.selected_bytes();
        let cursor = self.buffer.cursor().max(selected_input);
        let offset = selected.len() + (cursor - selected_input);
        (self.preedit(), offset)
    }

    /// Committed prefix plus the current best sentence.
    pub fn sentence(&self) -> String {
        let mut out = self.selected_text();
        if let Some(best) = self.candidates.first() {
            out.push_str(&best.text());
        }
        out
    }

    /// The keys still needed to finish candidate `i`'s code, empty when
    /// its code is fully typed (or unknown).
    pub fn candidate_hint(&self, i: usize) -> String {
        let candidate = match self.candidates.get(i) {
            Some(c) => c,
            None => return String::new(),
        };
        let word = match candidate.words.as_slice() {
            [w] => w,
            _ => return String::new(),
        };
        let code = match word.data.table_code() {
            Some(c) => c,
            None => return String::new(),
        };
        let typed = word.to.saturating_sub(word.from);
        if typed >= code.len() {
            return String::new();
        }
        std::str::from_utf8(&code[typed..])
            .unwrap_or("")
            .to_string()
    }

    /// Feed the fully selected sentence into the history bigram; with
    /// auto-learning on, record the committed phrase under its
    /// concatenated code.
    pub fn learn(&mut self) {
        if !self.selected() {
            return;
        }
        let words: Vec<SentenceWord> = self
            .selected
            .iter()
            .flat_map(|s| s.words.iter().cloned())
            .collect();
        let texts: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
        self.ime.model().history_mut().add(&texts);

        if self.ime.options().learning != TableLearning::Auto || words.len() < 2 {
            return;
        }
        let mut code = String::new();
        let mut text = String::new();
        for word in &words {
            match word.data.table_code().and_then(|c| std::str::from_utf8(c).ok()) {
                Some(c) => {
                    code.push_str(c);
                    text.push_str(&word.word);
                }
                None => return,
            }
        }
        let exists = self
            .ime
            .dict()
            .lookup(&code)
            .iter()
            .any(|e| e.word == text);
        if !exists {
            debug!(word = %text, code = %code, "auto-learning table phrase");
            let _ = self.ime.dict_mut().add_word(&code, &text, TableFlag::Auto);
        }
    }

    fn update(&mut self) {
        let ime = Rc::clone(&self.ime);
        let remaining = self.buffer.user_input()[self.selected_bytes()..].to_string();

        let selected_texts: Vec<String> = self.selected_words();
        let state = Prediction::advance(
            ime.model(),
            &ime.model().null_state(),
            &selected_texts,
        );
        let params = DecodeParams {
            nbest: ime.nbest(),
            state,
            max_distance: ime.max_distance(),
            min_score: ime.min_score(),
            beam_size: ime.beam_size(),
            frame_size: ime.frame_size(),
        };
        {
            let dict = ime.dict();
            self.graph = graph_for_code(&remaining, &dict);
            // No match-state helper: the lattice must start clean.
            self.lattice.clear();
            Decoder::decode(
                &*dict,
                ime.model(),
                &mut self.lattice,
                &self.graph,
                &params,
                None,
            );
        }
        self.rebuild_candidates();
    }

    /// Sentence results first, then single words anchored at the start of
    /// the remaining input, best first, deduplicated by text.
    fn rebuild_candidates(&mut self) {
        self.candidates = self.lattice.sentences().to_vec();
        let start_id = self.graph.start().id();
        let mut singles: Vec<SentenceResult> = Vec::new();
        for gnode in self.graph.iter() {
            for &i in self.lattice.nodes(gnode.id()) {
                let node = self.lattice.node(i);
                if node.path.len() >= 2
                    && node.from_node() == start_id
                    && node.score.is_finite()
                {
                    singles.push(SentenceResult {
                        words: vec![SentenceWord {
                            word: node.word.word().to_string(),
                            idx: node.word.idx(),
                            from: node.from_offset,
                            to: node.to_offset,
                            data: node.data.clone(),
                        }],
                        score: node.score,
                    });
                }
            }
        }
        singles.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.text().cmp(&b.text()))
        });
        let mut seen: AHashSet<String> =
            self.candidates.iter().map(|c| c.text()).collect();
        for single in singles {
            if seen.insert(single.text()) {
                self.candidates.push(single);
            }
        }
    }
}

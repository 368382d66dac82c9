//! Editing context: buffer, segment graph, lattice and the selection
//! ledger.
//!
//! Every edit re-parses the remaining (unselected) input, diffs the new
//! segment graph against the old one, discards only the invalidated
//! lattice nodes and match-state walks, and re-decodes. Selecting a
//! candidate moves its words into the ledger; the rest of the input is
//! decoded again with the language-model state advanced over the
//! selection.

use std::rc::Rc;

use ahash::AHashSet;
use tracing::debug;

use libshuru_core::{
    Connection, DecodeParams, Decoder, Error, InputBuffer, Lattice, LanguageModelBase, Prediction,
    Result, SegmentGraph, SentenceResult, SentenceWord, USER_DICT,
};

use crate::encoder::PinyinEncoder;
use crate::ime::PinyinIme;
use crate::match_state::PinyinMatchState;
use crate::syllable::FuzzyFlags;

#[derive(Debug, Clone)]
struct Selection {
    words: Vec<SentenceWord>,
    /// Input bytes this selection consumed.
    length: usize,
}

pub struct PinyinContext {
    ime: Rc<PinyinIme>,
    buffer: InputBuffer,
    graph: SegmentGraph,
    lattice: Lattice,
    match_state: Rc<std::cell::RefCell<PinyinMatchState>>,
    selected: Vec<Selection>,
    candidates: Vec<SentenceResult>,
    conn: Connection,
}

impl PinyinContext {
    pub fn new(ime: Rc<PinyinIme>) -> Self {
        let match_state = Rc::new(std::cell::RefCell::new(PinyinMatchState::new(
            ime.fuzzy_flags(),
        )));
        let listener = Rc::clone(&match_state);
        let conn = ime
            .dict()
            .connect_changed(move |layer| listener.borrow_mut().discard_dictionary(*layer));
        Self {
            buffer: InputBuffer::new(true),
            graph: SegmentGraph::new(String::new()),
            lattice: Lattice::new(),
            match_state,
            selected: Vec::new(),
            candidates: Vec::new(),
            conn,
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
        self.match_state.borrow_mut().clear_search();
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

    /// Feed the fully selected sentence into the history bigram and add
    /// newly seen adjacent word pairs to the user dictionary.
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

        for pair in words.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (code_a, code_b) = match (
                a.data.encoded_pinyin(),
                b.data.encoded_pinyin(),
            ) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let mut code = code_a.to_vec();
            code.extend_from_slice(code_b);
            let text = format!("{}{}", a.word, b.word);
            let exists = self.ime.dict().word_exists(&code, &text);
            if !exists {
                debug!(word = %text, "learning user-dictionary bigram");
                // Emits dictionary_changed, which flushes this context's
                // match caches through the connected listener.
                let _ = self.ime.dict_mut().add_word(USER_DICT, &code, &text, 0.0);
            }
        }
    }

    fn update(&mut self) {
        let ime = Rc::clone(&self.ime);
        let flags: FuzzyFlags = ime.fuzzy_flags();
        let profile = ime.shuangpin_profile();
        {
            let mut ms = self.match_state.borrow_mut();
            ms.set_flags(flags);
            ms.set_shuangpin(profile.clone());
        }

        let remaining = self.buffer.user_input()[self.selected_bytes()..].to_string();
        let new_graph = match &profile {
            Some(p) => p.parse_user_shuangpin(&remaining),
            None => PinyinEncoder::parse_user_pinyin(&remaining, flags),
        };
        let since = self.graph.check(&new_graph);
        if since <= new_graph.size() {
            let removed: AHashSet<_> = self.graph.merge(new_graph, since).into_iter().collect();
            self.lattice.discard_node(&removed);
            self.match_state.borrow_mut().discard_node(&removed);
        }

        let selected_texts: Vec<String> = self
            .selected
            .iter()
            .flat_map(|s| s.words.iter())
            .map(|w| w.word.clone())
            .collect();
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
            let mut ms = self.match_state.borrow_mut();
            Decoder::decode(
                &*dict,
                ime.model(),
                &mut self.lattice,
                &self.graph,
                &params,
                Some(&mut ms),
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

impl Drop for PinyinContext {
    fn drop(&mut self) {
        self.ime.dict().disconnect_changed(self.conn);
    }
}

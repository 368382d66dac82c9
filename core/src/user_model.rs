//! User language model: the static n-gram mixed with online history.
//!
//! This is the model handed to decoders in interactive use. It halves the
//! static score and adds the history-bigram contribution, so freshly
//! learned phrases can win against the static distribution without
//! retraining. The scoring state is the static model's state extended by
//! four bytes naming the predecessor word (an id into a session-local
//! intern table), which is what the history bigram needs as context.

use std::cell::{Ref, RefCell, RefMut};

use ahash::AHashMap;

use crate::history_bigram::{HistoryBigram, HistoryConfig};
use crate::language_model::{
    LanguageModel, LanguageModelBase, State, WordIndex, BASE_STATE_SIZE,
};
use crate::lattice::WordNode;

const NULL_HISTORY: u32 = u32::MAX;
/// State length of the user model: base state + history context word id.
pub const USER_STATE_SIZE: usize = BASE_STATE_SIZE + 4;

#[derive(Debug)]
pub struct UserLanguageModel {
    model: LanguageModel,
    history: RefCell<HistoryBigram>,
    history_weight: f32,
    interned: RefCell<Vec<String>>,
    intern_ids: RefCell<AHashMap<String, u32>>,
}

impl UserLanguageModel {
    pub fn new(model: LanguageModel) -> Self {
        Self::with_history(model, HistoryBigram::default())
    }

    pub fn with_history(model: LanguageModel, history: HistoryBigram) -> Self {
        Self {
            model,
            history: RefCell::new(history),
            history_weight: 0.5,
            interned: RefCell::new(Vec::new()),
            intern_ids: RefCell::new(AHashMap::new()),
        }
    }

    pub fn with_history_config(model: LanguageModel, config: HistoryConfig) -> Self {
        Self::with_history(model, HistoryBigram::new(config))
    }

    pub fn set_history_weight(&mut self, weight: f32) {
        self.history_weight = weight;
    }

    /// The wrapped static model.
    pub fn model(&self) -> &LanguageModel {
        &self.model
    }

    pub fn history(&self) -> Ref<'_, HistoryBigram> {
        self.history.borrow()
    }

    pub fn history_mut(&self) -> RefMut<'_, HistoryBigram> {
        self.history.borrow_mut()
    }

    fn intern(&self, word: &str) -> u32 {
        if let Some(&id) = self.intern_ids.borrow().get(word) {
            return id;
        }
        let mut interned = self.interned.borrow_mut();
        let id = interned.len() as u32;
        interned.push(word.to_string());
        self.intern_ids.borrow_mut().insert(word.to_string(), id);
        id
    }

    fn interned_word(&self, id: u32) -> Option<String> {
        self.interned.borrow().get(id as usize).cloned()
    }

    fn split_state(state: &[u8]) -> (&[u8], u32) {
        if state.len() < USER_STATE_SIZE {
            return (state, NULL_HISTORY);
        }
        let (base, rest) = state.split_at(BASE_STATE_SIZE);
        let ctx = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        (base, ctx)
    }

    fn extend_state(mut base: State, ctx: u32) -> State {
        base.extend_from_slice(&ctx.to_le_bytes());
        base
    }
}

impl LanguageModelBase for UserLanguageModel {
    fn begin_sentence(&self) -> WordIndex {
        self.model.begin_sentence()
    }

    fn end_sentence(&self) -> WordIndex {
        self.model.end_sentence()
    }

    fn unknown(&self) -> WordIndex {
        self.model.unknown()
    }

    fn begin_state(&self) -> State {
        Self::extend_state(self.model.begin_state(), NULL_HISTORY)
    }

    fn null_state(&self) -> State {
        Self::extend_state(self.model.null_state(), NULL_HISTORY)
    }

    fn index(&self, word: &str) -> WordIndex {
        self.model.index(word)
    }

    fn score(&self, state: &[u8], word: &WordNode, out: &mut State) -> f32 {
        let (base_state, history_ctx) = Self::split_state(state);
        let mut base_out = State::new();
        let static_score = self.model.score(base_state, word, &mut base_out) / 2.0;

        let prev = if history_ctx == NULL_HISTORY {
            String::new()
        } else {
            self.interned_word(history_ctx).unwrap_or_default()
        };
        let history_score = self.history.borrow().score(&prev, word.word());

        let next_ctx = if word.word().is_empty() {
            NULL_HISTORY
        } else {
            self.intern(word.word())
        };
        *out = Self::extend_state(base_out, next_ctx);
        static_score + self.history_weight * history_score
    }

    fn predict(&self, state: &[u8], max: usize) -> Vec<(String, f32)> {
        let (base_state, history_ctx) = Self::split_state(state);
        let mut candidates: Vec<String> = self
            .model
            .predict(base_state, max)
            .into_iter()
            .map(|(w, _)| w)
            .collect();
        if history_ctx != NULL_HISTORY {
            if let Some(prev) = self.interned_word(history_ctx) {
                self.history
                    .borrow()
                    .fill_predict(&mut candidates, &[prev], max);
            }
        }
        // Rescore every candidate on the mixed scale.
        let mut out: Vec<(String, f32)> = candidates
            .into_iter()
            .map(|w| {
                let score = self.single_word_score(state, &w);
                (w, score)
            })
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out.dedup_by(|a, b| a.0 == b.0);
        if max > 0 && out.len() > max {
            out.truncate(max);
        }
        out
    }
}

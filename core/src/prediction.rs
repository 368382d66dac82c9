//! Next-word prediction from a committed sentence prefix.
//!
//! The model supplies the continuations (the user model merges its static
//! bigram table with the history bigram); this helper advances the scoring
//! state over the prefix and shapes the result: score-descending, ties by
//! text, duplicates removed, bounded by `max`.

use crate::language_model::{LanguageModelBase, State};
use crate::lattice::WordNode;

#[derive(Debug, Default)]
pub struct Prediction;

impl Prediction {
    /// Scored continuations of `sentence` under `model`.
    pub fn predict_with_score(
        model: &dyn LanguageModelBase,
        state: &[u8],
        sentence: &[String],
        max: usize,
    ) -> Vec<(String, f32)> {
        let ctx = Self::advance(model, state, sentence);
        let mut out = model.predict(&ctx, max);
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out.dedup_by(|a, b| a.0 == b.0);
        if max > 0 && out.len() > max {
            out.truncate(max);
        }
        out
    }

    /// Continuations without scores.
    pub fn predict(
        model: &dyn LanguageModelBase,
        state: &[u8],
        sentence: &[String],
        max: usize,
    ) -> Vec<String> {
        Self::predict_with_score(model, state, sentence, max)
            .into_iter()
            .map(|(w, _)| w)
            .collect()
    }

    /// Fold the sentence words into the scoring state.
    pub fn advance(model: &dyn LanguageModelBase, state: &[u8], sentence: &[String]) -> State {
        let mut cur = state.to_vec();
        let mut out = State::new();
        for word in sentence {
            let node = WordNode::new(word.as_str(), model.index(word));
            model.score(&cur, &node, &mut out);
            std::mem::swap(&mut cur, &mut out);
        }
        cur
    }
}

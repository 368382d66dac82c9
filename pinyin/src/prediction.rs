//! Prediction of the next word after a committed sentence.
//!
//! Two sources merge into one ranked list: continuations the language
//! model knows for the sentence context, and dictionary words whose code
//! extends the last committed word's encoded pinyin and whose text starts
//! with that word (typing "guoqing", committing 中国, predicts 庆 from
//! 中国庆). Ties break by text; duplicates collapse.

use libshuru_core::{LanguageModelBase, Prediction, State};

use crate::dict::PinyinDictionary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinyinPredictionSource {
    Model,
    Dictionary,
}

#[derive(Debug, Default)]
pub struct PinyinPrediction;

impl PinyinPrediction {
    /// Predict continuations of `sentence`. `last_encoded` is the encoded
    /// pinyin of the last committed word (empty to skip the dictionary
    /// source); `max == 0` means unbounded.
    pub fn predict(
        model: &dyn LanguageModelBase,
        dict: &PinyinDictionary,
        state: &[u8],
        sentence: &[String],
        last_encoded: &[u8],
        max: usize,
    ) -> Vec<(String, PinyinPredictionSource)> {
        if last_encoded.is_empty() || sentence.is_empty() {
            return Prediction::predict(model, state, sentence, max)
                .into_iter()
                .map(|w| (w, PinyinPredictionSource::Model))
                .collect();
        }

        let mut merged: Vec<(String, f32, PinyinPredictionSource)> =
            Prediction::predict_with_score(model, state, sentence, max)
                .into_iter()
                .map(|(w, s)| (w, s, PinyinPredictionSource::Model))
                .collect();

        // Context state up to (but not including) the last committed word;
        // dictionary hits are scored as that word's longer replacements.
        let prefix = &sentence[..sentence.len() - 1];
        let prev_state: State = Prediction::advance(model, state, prefix);
        let last_word = sentence.last().map(|s| s.as_str()).unwrap_or("");

        dict.match_words_prefix(last_encoded, &mut |_, word, cost| {
            if word.len() > last_word.len() && word.starts_with(last_word) {
                let continuation = word[last_word.len()..].to_string();
                let score = cost + model.single_word_score(&prev_state, word);
                merged.push((continuation, score, PinyinPredictionSource::Dictionary));
            }
            true
        });

        merged.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let mut out: Vec<(String, PinyinPredictionSource)> = Vec::new();
        for (word, _, source) in merged {
            if out.iter().any(|(w, _)| *w == word) {
                continue;
            }
            out.push((word, source));
            if max > 0 && out.len() >= max {
                break;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::PinyinDictFormat;
    use libshuru_core::{LanguageModelBuilder, UserLanguageModel, SYSTEM_DICT};
    use std::io::Cursor;

    #[test]
    fn test_dictionary_continuation() {
        let mut dict = PinyinDictionary::new();
        dict.load(
            SYSTEM_DICT,
            &mut Cursor::new("中国庆 zhong'guo'qing -0.5\n中国 zhong'guo 0.0\n".as_bytes()),
            PinyinDictFormat::Text,
        )
        .unwrap();

        let mut builder = LanguageModelBuilder::new();
        builder.add_word_count("中国", 10);
        builder.add_word_count("中国庆", 1);
        let model = UserLanguageModel::new(builder.build());

        let encoded = crate::encoder::PinyinEncoder::encode_full_pinyin("zhong'guo'qing").unwrap();
        let state = model.null_state();
        let result = PinyinPrediction::predict(
            &model,
            &dict,
            &state,
            &["中国".to_string()],
            &encoded[..4],
            5,
        );
        assert!(
            result
                .iter()
                .any(|(w, s)| w == "庆" && *s == PinyinPredictionSource::Dictionary),
            "{result:?}"
        );
    }

    #[test]
    fn test_model_only_without_encoded_pinyin() {
        let mut builder = LanguageModelBuilder::new();
        builder.add_sentence(&["中国", "人民"]);
        let model = UserLanguageModel::new(builder.build());
        let state = model.null_state();
        let result = PinyinPrediction::predict(
            &model,
            &PinyinDictionary::new(),
            &state,
            &["中国".to_string()],
            &[],
            5,
        );
        assert!(result
            .iter()
            .any(|(w, s)| w == "人民" && *s == PinyinPredictionSource::Model));
    }
}

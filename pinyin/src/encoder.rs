//! Pinyin text <-> syllable codes, and user-input segmentation.
//!
//! `parse_user_pinyin` turns ambiguous typed pinyin into a segment graph.
//! It walks positions with a min-heap, taking the longest table match at
//! each step; when a complete match ends in one of `a e g n o r` and its
//! one-shorter prefix is also a syllable, both readings are kept if the
//! lookahead ties (this is what keeps "jinan" segmentable as both
//! ji'nan and jin'an). Runs of `'` collapse to one zero-width edge.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use libshuru_core::{Error, Result, SegmentGraph};

use crate::data::{
    inner_segments, is_initial_str, is_valid_initial_final, pinyin_map, FINAL_FUZZIES,
    INITIAL_FUZZIES, MAX_PINYIN_LENGTH,
};
use crate::syllable::{FuzzyFlags, PinyinFinal, PinyinInitial, PinyinSyllable};

/// All (initial, finals) readings of one typed chunk. Each final carries
/// whether a fuzzy rule produced it.
pub type SyllableReadings = Vec<(PinyinInitial, Vec<(PinyinFinal, bool)>)>;

pub struct PinyinEncoder;

/// Longest table match at the head of `s`; the flag says whether it is a
/// complete syllable (the stray consonants m/n/r never are).
fn longest_match(s: &str, flags: FuzzyFlags) -> (usize, bool) {
    let max = s.len().min(MAX_PINYIN_LENGTH);
    for l in (1..=max).rev() {
        let cand = match s.get(..l) {
            Some(c) => c,
            None => continue,
        };
        if let Some(entries) = pinyin_map().get(cand) {
            if entries.iter().any(|e| flags.allows(e.flags)) {
                return (l, !matches!(cand, "m" | "n" | "r"));
            }
        }
        if l <= 2 && is_initial_str(cand) {
            return (l, false);
        }
    }
    (1, false)
}

impl PinyinEncoder {
    /// Segment typed pinyin into a graph of candidate syllable boundaries.
    /// Pinyin input is ASCII; anything else becomes a single opaque edge.
    pub fn parse_user_pinyin(pinyin: &str, flags: FuzzyFlags) -> SegmentGraph {
        let mut graph = SegmentGraph::new(pinyin.to_string());
        if !pinyin.is_ascii() {
            if !pinyin.is_empty() {
                graph.add_edge(0, pinyin.len());
            }
            return graph;
        }
        let data = pinyin.to_string();
        let bytes = data.as_bytes();
        let mut queue: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
        queue.push(Reverse(0));

        while let Some(Reverse(top)) = queue.pop() {
            while queue.peek() == Some(&Reverse(top)) {
                queue.pop();
            }
            if top >= data.len() {
                continue;
            }
            if bytes[top] == b'\'' {
                let mut next = top;
                while next < data.len() && bytes[next] == b'\'' {
                    next += 1;
                }
                graph.add_edge(top, next);
                if next < data.len() {
                    queue.push(Reverse(next));
                }
                continue;
            }

            let (m_len, complete) = longest_match(&data[top..], flags);
            if !complete {
                graph.add_edge(top, top + m_len);
                queue.push(Reverse(top + m_len));
                continue;
            }

            let s = &data[top..top + m_len];
            let last = bytes[top + m_len - 1];
            let mut next_sizes = [0usize; 2];
            let mut n_sizes = 0;
            // A complete syllable may also read as its one-shorter prefix
            // plus a re-matched tail. Only letters that can both end and
            // start a syllable create the ambiguity, and never across an
            // explicit separator (otherwise jin'an would parse as ji'n).
            if m_len > 1
                && top + m_len < data.len()
                && bytes[top + m_len] != b'\''
                && matches!(last, b'a' | b'e' | b'g' | b'n' | b'o' | b'r')
                && pinyin_map().contains_key(&s[..m_len - 1])
            {
                let next = longest_match(&data[top + m_len..], flags);
                let next_alt = longest_match(&data[top + m_len - 1..], flags);
                let keep = (m_len + next.0, next.1);
                let keep_alt = (m_len - 1 + next_alt.0, next_alt.1);
                if keep >= keep_alt {
                    graph.add_edge(top, top + m_len);
                    queue.push(Reverse(top + m_len));
                    next_sizes[n_sizes] = m_len;
                    n_sizes += 1;
                }
                if keep <= keep_alt {
                    graph.add_edge(top, top + m_len - 1);
                    queue.push(Reverse(top + m_len - 1));
                    next_sizes[n_sizes] = m_len - 1;
                    n_sizes += 1;
                }
            } else {
                graph.add_edge(top, top + m_len);
                queue.push(Reverse(top + m_len));
                next_sizes[n_sizes] = m_len;
                n_sizes += 1;
            }

            if flags.contains(FuzzyFlags::INNER) {
                for &size in &next_sizes[..n_sizes] {
                    if size >= 4 {
                        if let Some((first, _)) = inner_segments().get(&data[top..top + size]) {
                            graph.add_edge(top, top + first.len());
                            graph.add_edge(top + first.len(), top + size);
                        }
                    }
                }
            }
        }
        graph
    }

    /// Encode a `'`-joined canonical spelling to 2 bytes per syllable.
    /// Fuzzy spellings are rejected.
    pub fn encode_full_pinyin(pinyin: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for syllable in pinyin.split('\'') {
            let entry = pinyin_map()
                .get(syllable)
                .and_then(|entries| entries.iter().find(|e| e.flags.is_empty()))
                .ok_or_else(|| {
                    Error::invalid_argument(format!("invalid full pinyin: {pinyin}"))
                })?;
            out.push(entry.initial as u8);
            out.push(entry.fin as u8);
        }
        Ok(out)
    }

    /// Inverse of [`PinyinEncoder::encode_full_pinyin`].
    pub fn decode_full_pinyin(data: &[u8]) -> Result<String> {
        if data.len() % 2 != 0 {
            return Err(Error::invalid_argument("invalid pinyin key"));
        }
        let mut out = String::new();
        for (i, pair) in data.chunks_exact(2).enumerate() {
            if i > 0 {
                out.push('\'');
            }
            out.push_str(PinyinInitial::from_byte(pair[0]).to_str());
            out.push_str(PinyinFinal::from_byte(pair[1]).to_str());
        }
        Ok(out)
    }

    /// Every (initial, final) reading of a typed chunk under the enabled
    /// fuzzy rules, including incomplete initial-only readings.
    pub fn string_to_syllables(pinyin: &str, flags: FuzzyFlags) -> SyllableReadings {
        let mut result: SyllableReadings = Vec::new();
        if !matches!(pinyin, "m" | "n" | "r") {
            if let Some(entries) = pinyin_map().get(pinyin) {
                for e in entries {
                    if flags.allows(e.flags) {
                        get_fuzzy(&mut result, PinyinSyllable::new(e.initial, e.fin), flags);
                    }
                }
            }
        }
        let initial = PinyinInitial::from_str(pinyin);
        if initial != PinyinInitial::Invalid && initial != PinyinInitial::Zero {
            get_fuzzy(
                &mut result,
                PinyinSyllable::new(initial, PinyinFinal::Invalid),
                flags,
            );
        }
        if result.is_empty() {
            result.push((
                PinyinInitial::Invalid,
                vec![(PinyinFinal::Invalid, false)],
            ));
        }
        result
    }

    pub fn is_valid_initial_final(initial: PinyinInitial, fin: PinyinFinal) -> bool {
        is_valid_initial_final(initial, fin)
    }
}

pub(crate) fn get_fuzzy(syls: &mut SyllableReadings, syl: PinyinSyllable, flags: FuzzyFlags) {
    let mut flags = flags;
    // An initial typed alone should also match its retroflex twin.
    if syl.fin == PinyinFinal::Invalid {
        match syl.initial {
            PinyinInitial::C => flags = flags | FuzzyFlags::C_CH,
            PinyinInitial::Z => flags = flags | FuzzyFlags::Z_ZH,
            PinyinInitial::S => flags = flags | FuzzyFlags::S_SH,
            _ => {}
        }
    }

    let mut initials = [syl.initial, PinyinInitial::Invalid];
    let mut n_initials = 1;
    for &(a, b, flag) in INITIAL_FUZZIES {
        if (syl.initial == a || syl.initial == b) && flags.contains(flag) {
            initials[1] = if syl.initial == a { b } else { a };
            n_initials = 2;
            break;
        }
    }

    let mut finals = [syl.fin, PinyinFinal::Invalid];
    let mut n_finals = 1;
    for &(a, b, flag) in FINAL_FUZZIES {
        if (syl.fin == a || syl.fin == b) && flags.contains(flag) {
            finals[1] = if syl.fin == a { b } else { a };
            n_finals = 2;
            break;
        }
    }

    for i in 0..n_initials {
        for j in 0..n_finals {
            let initial = initials[i];
            let fin = finals[j];
            if (i == 0 && j == 0)
                || fin == PinyinFinal::Invalid
                || is_valid_initial_final(initial, fin)
            {
                let entry = match syls.iter_mut().find(|(ini, _)| *ini == initial) {
                    Some(entry) => entry,
                    None => {
                        syls.push((initial, Vec::new()));
                        syls.last_mut().unwrap()
                    }
                };
                if !entry.1.iter().any(|(f, _)| *f == fin) {
                    entry.1.push((fin, i > 0 || j > 0));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges_from(graph: &SegmentGraph, offset: usize) -> Vec<usize> {
        graph
            .node_at(offset)
            .map(|n| n.next().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_plain() {
        let graph = PinyinEncoder::parse_user_pinyin("nihao", FuzzyFlags::NONE);
        assert_eq!(edges_from(&graph, 0), vec![2]);
        assert_eq!(edges_from(&graph, 2), vec![5]);
    }

    #[test]
    fn test_greedy_split_keeps_both_branches() {
        let graph = PinyinEncoder::parse_user_pinyin("jinan", FuzzyFlags::NONE);
        // "jin" + "an" (preferred) and "ji" + "nan" both survive.
        let from0 = edges_from(&graph, 0);
        assert!(from0.contains(&3), "expected jin edge, got {from0:?}");
        assert!(from0.contains(&2), "expected ji edge, got {from0:?}");
        assert_eq!(edges_from(&graph, 3), vec![5]);
        assert_eq!(edges_from(&graph, 2), vec![5]);
    }

    #[test]
    fn test_separator_prevents_short_reading() {
        let graph = PinyinEncoder::parse_user_pinyin("jin'an", FuzzyFlags::NONE);
        // jin must not shrink to ji before the separator.
        assert_eq!(edges_from(&graph, 0), vec![3]);
        assert_eq!(edges_from(&graph, 3), vec![4]);
        assert_eq!(edges_from(&graph, 4), vec![6]);
    }

    #[test]
    fn test_separator_runs_collapse() {
        let graph = PinyinEncoder::parse_user_pinyin("ni'''hao", FuzzyFlags::NONE);
        assert_eq!(edges_from(&graph, 0), vec![2]);
        assert_eq!(edges_from(&graph, 2), vec![5]);
        assert_eq!(edges_from(&graph, 5), vec![8]);
    }

    #[test]
    fn test_inner_segmentation() {
        let plain = PinyinEncoder::parse_user_pinyin("xian", FuzzyFlags::NONE);
        assert_eq!(edges_from(&plain, 0), vec![4]);

        let inner = PinyinEncoder::parse_user_pinyin("xian", FuzzyFlags::INNER);
        let from0 = edges_from(&inner, 0);
        assert!(from0.contains(&4));
        assert!(from0.contains(&2), "expected xi edge, got {from0:?}");
        assert_eq!(edges_from(&inner, 2), vec![4]);
    }

    #[test]
    fn test_incomplete_consonant() {
        let graph = PinyinEncoder::parse_user_pinyin("nd", FuzzyFlags::NONE);
        // "n" is incomplete, "d" is a bare initial.
        assert_eq!(edges_from(&graph, 0), vec![1]);
        assert_eq!(edges_from(&graph, 1), vec![2]);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let code = PinyinEncoder::encode_full_pinyin("ni'hao").unwrap();
        assert_eq!(
            code,
            vec![
                PinyinInitial::N as u8,
                PinyinFinal::I as u8,
                PinyinInitial::H as u8,
                PinyinFinal::AO as u8,
            ]
        );
        assert_eq!(PinyinEncoder::decode_full_pinyin(&code).unwrap(), "ni'hao");
    }

    #[test]
    fn test_encode_rejects_fuzzy_and_garbage() {
        assert!(PinyinEncoder::encode_full_pinyin("shong").is_err());
        assert!(PinyinEncoder::encode_full_pinyin("q'x").is_err());
        assert!(PinyinEncoder::decode_full_pinyin(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_string_to_syllables_fuzzy() {
        let plain = PinyinEncoder::string_to_syllables("zang", FuzzyFlags::NONE);
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].0, PinyinInitial::Z);
        assert_eq!(plain[0].1, vec![(PinyinFinal::ANG, false)]);

        let fuzzy = PinyinEncoder::string_to_syllables(
            "zang",
            FuzzyFlags::Z_ZH | FuzzyFlags::AN_ANG,
        );
        let z = fuzzy.iter().find(|(i, _)| *i == PinyinInitial::Z).unwrap();
        assert!(z.1.contains(&(PinyinFinal::ANG, false)));
        assert!(z.1.contains(&(PinyinFinal::AN, true)));
        let zh = fuzzy.iter().find(|(i, _)| *i == PinyinInitial::ZH).unwrap();
        assert!(zh.1.iter().all(|(_, fuzzy)| *fuzzy));
    }

    #[test]
    fn test_bare_initial_reading() {
        let readings = PinyinEncoder::string_to_syllables("zh", FuzzyFlags::NONE);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].0, PinyinInitial::ZH);
        assert_eq!(readings[0].1, vec![(PinyinFinal::Invalid, false)]);
    }

    #[test]
    fn test_unknown_chunk_is_invalid() {
        let readings = PinyinEncoder::string_to_syllables("io", FuzzyFlags::NONE);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].0, PinyinInitial::Invalid);
    }
}

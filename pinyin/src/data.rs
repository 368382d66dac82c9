//! Compiled-in pinyin tables.
//!
//! The canonical syllable inventory is written as one finals list per
//! initial; the spelling of a syllable is always the concatenation of the
//! two halves, so the table cannot drift from the decomposition. On first
//! use the inventory is expanded into the program-wide lookup structures:
//!
//! - the pinyin map: spelling -> entries, canonical ones untagged plus
//!   generated fuzzy spellings tagged with the flag that legalizes them
//!   (e.g. "shong" via s<->sh, "jv" via v<->u),
//! - the valid (initial, final) bitmap,
//! - the inner-segment table: 4+ letter syllables that can be re-read as
//!   two shorter ones ("xian" -> "xi" + "an").

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::syllable::{FuzzyFlags, PinyinFinal, PinyinInitial};

/// Longest spelling the segmenter will consider.
pub const MAX_PINYIN_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy)]
pub struct PinyinEntry {
    pub initial: PinyinInitial,
    pub fin: PinyinFinal,
    pub flags: FuzzyFlags,
}

use PinyinFinal as F;
use PinyinInitial as I;

/// Canonical finals per initial. Spelling = initial text + final text.
static INITIAL_FINALS: &[(PinyinInitial, &[PinyinFinal])] = &[
    (
        I::B,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::EI,
            F::EN,
            F::ENG,
            F::I,
            F::IAN,
            F::IAO,
            F::IE,
            F::IN,
            F::ING,
            F::O,
            F::U,
        ],
    ),
    (
        I::P,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::EI,
            F::EN,
            F::ENG,
            F::I,
            F::IAN,
            F::IAO,
            F::IE,
            F::IN,
            F::ING,
            F::O,
            F::OU,
            F::U,
        ],
    ),
    (
        I::M,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::I,
            F::IAN,
            F::IAO,
            F::IE,
            F::IN,
            F::ING,
            F::IU,
            F::O,
            F::OU,
            F::U,
        ],
    ),
    (
        I::F,
        &[F::A, F::AN, F::ANG, F::EI, F::EN, F::ENG, F::O, F::OU, F::U],
    ),
    (
        I::D,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::I,
            F::IA,
            F::IAN,
            F::IAO,
            F::IE,
            F::ING,
            F::IU,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::T,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::ENG,
            F::I,
            F::IAN,
            F::IAO,
            F::IE,
            F::ING,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::N,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::I,
            F::IAN,
            F::IANG,
            F::IAO,
            F::IE,
            F::IN,
            F::ING,
            F::IU,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UO,
            F::V,
            F::VE,
        ],
    ),
    (
        I::L,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::ENG,
            F::I,
            F::IA,
            F::IAN,
            F::IANG,
            F::IAO,
            F::IE,
            F::IN,
            F::ING,
            F::IU,
            F::O,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UN,
            F::UO,
            F::V,
            F::VE,
        ],
    ),
    (
        I::G,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::ONG,
            F::OU,
            F::U,
            F::UA,
            F::UAI,
            F::UAN,
            F::UANG,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::K,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::ONG,
            F::OU,
            F::U,
            F::UA,
            F::UAI,
            F::UAN,
            F::UANG,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::H,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::ONG,
            F::OU,
            F::U,
            F::UA,
            F::UAI,
            F::UAN,
            F::UANG,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::J,
        &[
            F::I,
            F::IA,
            F::IAN,
            F::IANG,
            F::IAO,
            F::IE,
            F::IN,
            F::ING,
            F::IONG,
            F::IU,
            F::U,
            F::UAN,
            F::UE,
            F::UN,
        ],
    ),
    (
        I::Q,
        &[
            F::I,
            F::IA,
            F::IAN,
            F::IANG,
            F::IAO,
            F::IE,
            F::IN,
            F::ING,
            F::IONG,
            F::IU,
            F::U,
            F::UAN,
            F::UE,
            F::UN,
        ],
    ),
    (
        I::X,
        &[
            F::I,
            F::IA,
            F::IAN,
            F::IANG,
            F::IAO,
            F::IE,
            F::IN,
            F::ING,
            F::IONG,
            F::IU,
            F::U,
            F::UAN,
            F::UE,
            F::UN,
        ],
    ),
    (
        I::ZH,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::I,
            F::ONG,
            F::OU,
            F::U,
            F::UA,
            F::UAI,
            F::UAN,
            F::UANG,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::CH,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EN,
            F::ENG,
            F::I,
            F::ONG,
            F::OU,
            F::U,
            F::UA,
            F::UAI,
            F::UAN,
            F::UANG,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::SH,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::I,
            F::OU,
            F::U,
            F::UA,
            F::UAI,
            F::UAN,
            F::UANG,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::R,
        &[
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EN,
            F::ENG,
            F::I,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::Z,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::I,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::C,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EN,
            F::ENG,
            F::I,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::S,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EN,
            F::ENG,
            F::I,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UI,
            F::UN,
            F::UO,
        ],
    ),
    (
        I::Y,
        &[
            F::A,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::I,
            F::IN,
            F::ING,
            F::O,
            F::ONG,
            F::OU,
            F::U,
            F::UAN,
            F::UE,
            F::UN,
        ],
    ),
    (
        I::W,
        &[F::A, F::AI, F::AN, F::ANG, F::EI, F::EN, F::ENG, F::O, F::U],
    ),
    (
        I::Zero,
        &[
            F::A,
            F::AI,
            F::AN,
            F::ANG,
            F::AO,
            F::E,
            F::EI,
            F::EN,
            F::ENG,
            F::ER,
            F::O,
            F::OU,
            F::NG,
        ],
    ),
];

/// Initial confusion classes, each with the flag that enables it.
pub static INITIAL_FUZZIES: &[(PinyinInitial, PinyinInitial, FuzzyFlags)] = &[
    (I::C, I::CH, FuzzyFlags::C_CH),
    (I::S, I::SH, FuzzyFlags::S_SH),
    (I::Z, I::ZH, FuzzyFlags::Z_ZH),
    (I::F, I::H, FuzzyFlags::F_H),
    (I::L, I::N, FuzzyFlags::L_N),
];

/// Final confusion classes.
pub static FINAL_FUZZIES: &[(PinyinFinal, PinyinFinal, FuzzyFlags)] = &[
    (F::V, F::U, FuzzyFlags::V_U),
    (F::AN, F::ANG, FuzzyFlags::AN_ANG),
    (F::EN, F::ENG, FuzzyFlags::EN_ENG),
    (F::IAN, F::IANG, FuzzyFlags::IAN_IANG),
    (F::IN, F::ING, FuzzyFlags::IN_ING),
    (F::U, F::OU, FuzzyFlags::U_OU),
    (F::UAN, F::UANG, FuzzyFlags::UAN_UANG),
    (F::VE, F::UE, FuzzyFlags::VE_UE),
];

pub struct PinyinData {
    map: HashMap<String, Vec<PinyinEntry>>,
    valid_pairs: HashSet<(u8, u8)>,
    inner: HashMap<String, (String, String)>,
}

static DATA: Lazy<PinyinData> = Lazy::new(build);

fn spelling(initial: PinyinInitial, fin: PinyinFinal) -> String {
    format!("{}{}", initial.to_str(), fin.to_str())
}

fn build() -> PinyinData {
    let mut map: HashMap<String, Vec<PinyinEntry>> = HashMap::new();
    let mut valid_pairs = HashSet::new();

    for &(initial, finals) in INITIAL_FINALS {
        for &fin in finals {
            map.entry(spelling(initial, fin)).or_default().push(PinyinEntry {
                initial,
                fin,
                flags: FuzzyFlags::NONE,
            });
            valid_pairs.insert((initial as u8, fin as u8));
        }
    }

    // Fuzzy spellings: apply one confusion to each canonical syllable and
    // keep the results that are not already real syllables.
    let canonical: Vec<(String, PinyinInitial, PinyinFinal)> = map
        .iter()
        .map(|(text, entries)| (text.clone(), entries[0].initial, entries[0].fin))
        .collect();
    let mut generated: Vec<(String, PinyinEntry)> = Vec::new();
    for (_, initial, fin) in &canonical {
        for &(a, b, flag) in INITIAL_FUZZIES {
            let twin = if *initial == a {
                b
            } else if *initial == b {
                a
            } else {
                continue;
            };
            let text = spelling(twin, *fin);
            if !map.contains_key(&text) {
                generated.push((
                    text,
                    PinyinEntry {
                        initial: twin,
                        fin: *fin,
                        flags: flag,
                    },
                ));
            }
        }
        for &(a, b, flag) in FINAL_FUZZIES {
            // v/u confusion only arises after j/q/x/y, where ü is written u.
            if flag == FuzzyFlags::V_U
                && !matches!(*initial, I::J | I::Q | I::X | I::Y)
            {
                continue;
            }
            // u/ou is a pronunciation blur, not an alternate spelling.
            if flag == FuzzyFlags::U_OU {
                continue;
            }
            let twin = if *fin == a {
                b
            } else if *fin == b {
                a
            } else {
                continue;
            };
            let text = spelling(*initial, twin);
            if !map.contains_key(&text) {
                generated.push((
                    text,
                    PinyinEntry {
                        initial: *initial,
                        fin: twin,
                        flags: flag,
                    },
                ));
            }
        }
    }
    for (text, entry) in generated {
        let entries = map.entry(text).or_default();
        if !entries
            .iter()
            .any(|e| e.initial == entry.initial && e.fin == entry.fin)
        {
            entries.push(entry);
        }
    }

    // Inner segmentation: a long syllable re-read as a shorter one plus a
    // standalone vowel syllable.
    let standalone: HashSet<&'static str> = [
        "a", "ai", "an", "ang", "ao", "e", "ei", "en", "eng", "er", "o", "ou",
    ]
    .into_iter()
    .collect();
    let mut inner = HashMap::new();
    for (text, _, _) in &canonical {
        if text.len() < 4 {
            continue;
        }
        for k in 2..text.len() {
            let (first, second) = text.split_at(k);
            if standalone.contains(second)
                && map
                    .get(first)
                    .is_some_and(|es| es.iter().any(|e| e.flags.is_empty()))
            {
                inner.insert(text.clone(), (first.to_string(), second.to_string()));
                break;
            }
        }
    }

    PinyinData {
        map,
        valid_pairs,
        inner,
    }
}

/// Spelling -> entries. Canonical entries carry no flags.
pub fn pinyin_map() -> &'static HashMap<String, Vec<PinyinEntry>> {
    &DATA.map
}

pub fn is_valid_initial_final(initial: PinyinInitial, fin: PinyinFinal) -> bool {
    if initial == PinyinInitial::Invalid || fin == PinyinFinal::Invalid {
        return false;
    }
    DATA.valid_pairs.contains(&(initial as u8, fin as u8))
}

/// Long-syllable re-segmentations: "xian" -> ("xi", "an").
pub fn inner_segments() -> &'static HashMap<String, (String, String)> {
    &DATA.inner
}

/// True if `s` spells a (possibly partial) initial like "b" or "zh".
pub fn is_initial_str(s: &str) -> bool {
    !s.is_empty() && PinyinInitial::from_str(s) != PinyinInitial::Invalid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_syllables_present() {
        let map = pinyin_map();
        for text in ["ni", "hao", "zhang", "xian", "jin", "an", "er", "lv", "jue"] {
            let entries = map.get(text).unwrap_or_else(|| panic!("missing {text}"));
            assert!(entries.iter().any(|e| e.flags.is_empty()), "{text} not canonical");
        }
    }

    #[test]
    fn test_generated_fuzzy_spellings() {
        let map = pinyin_map();
        // s/sh: "song" is real, "shong" only exists under the flag.
        let shong = map.get("shong").expect("shong generated");
        assert!(shong.iter().all(|e| e.flags == FuzzyFlags::S_SH));
        // v/u after j: "jv" spells "ju".
        let jv = map.get("jv").expect("jv generated");
        assert!(jv.iter().all(|e| e.flags == FuzzyFlags::V_U));
        // No v/u spellings away from j/q/x/y.
        assert!(!map.contains_key("bv"));
    }

    #[test]
    fn test_valid_pairs() {
        assert!(is_valid_initial_final(PinyinInitial::N, PinyinFinal::I));
        assert!(is_valid_initial_final(PinyinInitial::Zero, PinyinFinal::ER));
        assert!(!is_valid_initial_final(PinyinInitial::B, PinyinFinal::ONG));
        assert!(!is_valid_initial_final(PinyinInitial::Invalid, PinyinFinal::A));
    }

    #[test]
    fn test_inner_segments() {
        let inner = inner_segments();
        assert_eq!(
            inner.get("xian"),
            Some(&("xi".to_string(), "an".to_string()))
        );
        assert_eq!(
            inner.get("huang"),
            Some(&("hu".to_string(), "ang".to_string()))
        );
        // Short syllables never split.
        assert!(!inner.contains_key("an"));
        // "ng" is not a standalone second half.
        assert!(!inner.contains_key("ming"));
    }

    #[test]
    fn test_initial_strings() {
        assert!(is_initial_str("zh"));
        assert!(is_initial_str("b"));
        assert!(!is_initial_str("io"));
        assert!(!is_initial_str(""));
    }
}

//! Shuangpin (double pinyin) keyboard profiles.
//!
//! A shuangpin layout presses exactly two keys per syllable: the first
//! names the initial, the second the final. A profile expands a key pair
//! into the full syllables it can mean (one key often covers two finals)
//! so the dictionary match can treat a 2-key segment like any other typed
//! syllable.
//!
//! Builtin layouts cover the three widely used schemes; custom layouts
//! load from a small text format, one mapping per line
//! (`ang=h`, `sh=u`, or `=o` to set the zero-initial mark key).

use std::collections::HashMap;
use std::io::Read;

use phf::phf_map;

use libshuru_core::{Error, Result, SegmentGraph};

use crate::data::pinyin_map;
use crate::encoder::{get_fuzzy, SyllableReadings};
use crate::syllable::{FuzzyFlags, PinyinFinal, PinyinInitial, PinyinSyllable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuangpinScheme {
    Microsoft,
    Ziranma,
    Xiaohe,
}

/// How a zero-initial syllable is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZeroStyle {
    /// A dedicated first key, e.g. `o` + final key.
    MarkKey(char),
    /// The final's own first letter plus its key ("ah" for "ang").
    FirstLetter,
}

static MS_SHENGMU: phf::Map<char, &'static str> = phf_map! {
    'u' => "sh",
    'i' => "ch",
    'v' => "zh",
};

static MS_YUNMU: phf::Map<char, &'static [&'static str]> = phf_map! {
    'a' => &["a"],
    'o' => &["o", "uo"],
    'e' => &["e"],
    'i' => &["i"],
    'u' => &["u"],
    'v' => &["v", "ue"],
    'b' => &["ou"],
    'c' => &["iao"],
    'd' => &["uang", "iang"],
    'f' => &["en"],
    'g' => &["eng", "ng"],
    'h' => &["ang"],
    'j' => &["an"],
    'k' => &["ao"],
    'l' => &["ai"],
    'm' => &["ian"],
    'n' => &["in"],
    'p' => &["un"],
    'q' => &["iu"],
    'r' => &["uan", "er"],
    's' => &["ong", "iong"],
    't' => &["ue"],
    'w' => &["ia", "ua"],
    'x' => &["ie"],
    'y' => &["uai", "v"],
    'z' => &["ei"],
};

static ZRM_SHENGMU: phf::Map<char, &'static str> = phf_map! {
    'u' => "sh",
    'i' => "ch",
    'v' => "zh",
};

static ZRM_YUNMU: phf::Map<char, &'static [&'static str]> = phf_map! {
    'a' => &["a"],
    'o' => &["o", "uo"],
    'e' => &["e"],
    'i' => &["i"],
    'u' => &["u"],
    'v' => &["v", "ui"],
    'b' => &["ou"],
    'c' => &["iao"],
    'd' => &["uang", "iang"],
    'f' => &["en"],
    'g' => &["eng", "ng"],
    'h' => &["ang"],
    'j' => &["an"],
    'k' => &["ao"],
    'l' => &["ai"],
    'm' => &["ian"],
    'n' => &["in"],
    'p' => &["un"],
    'q' => &["iu"],
    'r' => &["uan", "er"],
    's' => &["ong", "iong"],
    't' => &["ue", "ve"],
    'w' => &["ua", "ia"],
    'x' => &["ie"],
    'y' => &["ing", "uai"],
    'z' => &["ei"],
};

static XIAOHE_SHENGMU: phf::Map<char, &'static str> = phf_map! {
    'u' => "sh",
    'i' => "ch",
    'v' => "zh",
};

static XIAOHE_YUNMU: phf::Map<char, &'static [&'static str]> = phf_map! {
    'a' => &["a"],
    'b' => &["in"],
    'c' => &["ao"],
    'd' => &["ai"],
    'e' => &["e"],
    'f' => &["en"],
    'g' => &["eng"],
    'h' => &["ang"],
    'i' => &["i"],
    'j' => &["an"],
    'k' => &["uai", "ing"],
    'l' => &["iang", "uang"],
    'm' => &["ian"],
    'n' => &["iao"],
    'o' => &["uo", "o"],
    'p' => &["ie"],
    'q' => &["iu"],
    'r' => &["uan", "er"],
    's' => &["ong", "iong"],
    't' => &["ue", "ve"],
    'u' => &["u"],
    'v' => &["v", "ui"],
    'w' => &["ei"],
    'x' => &["ia", "ua"],
    'y' => &["un"],
    'z' => &["ou"],
};

#[derive(Debug)]
pub struct ShuangpinProfile {
    /// (first key, second key) -> syllables the pair can mean.
    table: HashMap<(char, char), Vec<PinyinSyllable>>,
}

/// Letters that name their own initial on the first key.
const PLAIN_INITIALS: &str = "bpmfdtnlgkhjqxrzcsyw";

impl ShuangpinProfile {
    pub fn builtin(scheme: ShuangpinScheme) -> Self {
        let (shengmu, yunmu, zero) = match scheme {
            ShuangpinScheme::Microsoft => (&MS_SHENGMU, &MS_YUNMU, ZeroStyle::MarkKey('o')),
            ShuangpinScheme::Ziranma => (&ZRM_SHENGMU, &ZRM_YUNMU, ZeroStyle::MarkKey('o')),
            ShuangpinScheme::Xiaohe => (&XIAOHE_SHENGMU, &XIAOHE_YUNMU, ZeroStyle::FirstLetter),
        };

        let mut initials: Vec<(char, PinyinInitial)> = Vec::new();
        for c in PLAIN_INITIALS.chars() {
            initials.push((c, PinyinInitial::from_str(&c.to_string())));
        }
        for (&key, &name) in shengmu.entries() {
            initials.push((key, PinyinInitial::from_str(name)));
        }

        let mut finals: Vec<(char, PinyinFinal)> = Vec::new();
        for (&key, &names) in yunmu.entries() {
            for &name in names {
                let fin = PinyinFinal::from_str(name);
                if fin != PinyinFinal::Invalid {
                    finals.push((key, fin));
                }
            }
        }

        let mut table: HashMap<(char, char), Vec<PinyinSyllable>> = HashMap::new();
        for &(ik, initial) in &initials {
            if initial == PinyinInitial::Invalid {
                continue;
            }
            for &(fk, fin) in &finals {
                Self::add_pair(&mut table, (ik, fk), initial, fin);
            }
        }
        for &(fk, fin) in &finals {
            match zero {
                ZeroStyle::MarkKey(mark) => {
                    Self::add_pair(&mut table, (mark, fk), PinyinInitial::Zero, fin);
                }
                ZeroStyle::FirstLetter => {
                    if let Some(first) = fin.to_str().chars().next() {
                        Self::add_pair(&mut table, (first, fk), PinyinInitial::Zero, fin);
                    }
                }
            }
        }
        Self { table }
    }

    /// Parse a custom layout. Lines are `final=key`, `initial=key` or
    /// `=key` for the zero-initial mark; `#` starts a comment line.
    pub fn from_text<R: Read>(reader: &mut R) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => {
                    Error::invalid_format("shuangpin layout is not valid UTF-8")
                }
                _ => Error::Io(e),
            })?;

        let mut shengmu: Vec<(char, PinyinInitial)> = Vec::new();
        let mut yunmu: Vec<(char, PinyinFinal)> = Vec::new();
        let mut zero_mark = 'o';
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, key) = match line.split_once('=') {
                Some((n, k)) => (n.trim(), k.trim()),
                None => continue,
            };
            let key = match key.chars().next() {
                Some(c) if key.chars().count() == 1 => c.to_ascii_lowercase(),
                _ => {
                    return Err(Error::invalid_format(format!(
                        "shuangpin layout: expected a single key in {line:?}"
                    )))
                }
            };
            if name.is_empty() {
                zero_mark = key;
                continue;
            }
            let fin = PinyinFinal::from_str(name);
            if fin != PinyinFinal::Invalid && !name.is_empty() {
                yunmu.push((key, fin));
                continue;
            }
            let initial = PinyinInitial::from_str(name);
            if initial != PinyinInitial::Invalid && initial != PinyinInitial::Zero {
                shengmu.push((key, initial));
            }
        }

        let mut initials: Vec<(char, PinyinInitial)> = Vec::new();
        for c in PLAIN_INITIALS.chars() {
            initials.push((c, PinyinInitial::from_str(&c.to_string())));
        }
        initials.extend(shengmu);

        let mut table: HashMap<(char, char), Vec<PinyinSyllable>> = HashMap::new();
        for &(ik, initial) in &initials {
            for &(fk, fin) in &yunmu {
                Self::add_pair(&mut table, (ik, fk), initial, fin);
            }
        }
        for &(fk, fin) in &yunmu {
            Self::add_pair(&mut table, (zero_mark, fk), PinyinInitial::Zero, fin);
        }
        Ok(Self { table })
    }

    fn add_pair(
        table: &mut HashMap<(char, char), Vec<PinyinSyllable>>,
        keys: (char, char),
        initial: PinyinInitial,
        fin: PinyinFinal,
    ) {
        // Only real syllables enter the table.
        let spelling = format!("{}{}", initial.to_str(), fin.to_str());
        let canonical = pinyin_map()
            .get(&spelling)
            .is_some_and(|es| es.iter().any(|e| e.flags.is_empty()));
        if !canonical {
            return;
        }
        let entry = table.entry(keys).or_default();
        let syl = PinyinSyllable::new(initial, fin);
        if !entry.contains(&syl) {
            entry.push(syl);
        }
    }

    /// Syllables a 2-key pair can mean.
    pub fn lookup(&self, first: char, second: char) -> &[PinyinSyllable] {
        self.table
            .get(&(first, second))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Readings of a typed segment: a full key pair, or a lone first key
    /// read as a bare initial.
    pub fn readings(&self, segment: &str, flags: FuzzyFlags) -> SyllableReadings {
        let chars: Vec<char> = segment.chars().collect();
        let mut result: SyllableReadings = Vec::new();
        match chars.as_slice() {
            [a, b] => {
                for syl in self.lookup(*a, *b) {
                    get_fuzzy(&mut result, *syl, flags);
                }
            }
            [a] => {
                let name = a.to_string();
                let initial = PinyinInitial::from_str(&name);
                if initial != PinyinInitial::Invalid && initial != PinyinInitial::Zero {
                    get_fuzzy(
                        &mut result,
                        PinyinSyllable::new(initial, PinyinFinal::Invalid),
                        flags,
                    );
                }
            }
            _ => {}
        }
        if result.is_empty() {
            result.push((
                PinyinInitial::Invalid,
                vec![(PinyinFinal::Invalid, false)],
            ));
        }
        result
    }

    /// Cut shuangpin input into 2-key segments (a trailing single key
    /// stays its own segment; `'` runs collapse like in full pinyin).
    pub fn parse_user_shuangpin(&self, input: &str) -> SegmentGraph {
        let mut graph = SegmentGraph::new(input.to_string());
        if !input.is_ascii() {
            if !input.is_empty() {
                graph.add_edge(0, input.len());
            }
            return graph;
        }
        let bytes = input.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                let mut next = i;
                while next < bytes.len() && bytes[next] == b'\'' {
                    next += 1;
                }
                graph.add_edge(i, next);
                i = next;
                continue;
            }
            let end = (i + 2).min(bytes.len());
            let end = if end > i + 1 && bytes[i + 1] == b'\'' {
                i + 1
            } else {
                end
            };
            graph.add_edge(i, end);
            i = end;
        }
        graph
    }
}

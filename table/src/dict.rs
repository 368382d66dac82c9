//! Table-code dictionary.
//!
//! Shape-based input maps short ASCII codes to words. Keys are the code
//! bytes, a separator, then the UTF-8 word; the 32-bit value packs an
//! insertion index (for stable candidate order) with a flag telling the
//! entry class apart: plain system data, user-added, auto-learned,
//! pinyin-assisted, prompt, or construct-rule entries.
//!
//! The text format carries a small header (`KeyCode=`, `Length=`,
//! `Pinyin=`, `Prompt=`, `ConstructPhrase=`, `InvalidChar=`), an optional
//! `[Rule]` section whose lines are preserved verbatim, and a `[Data]`
//! section of `CODE WORD` lines. The binary form is a magic + version +
//! header image + double-array image, all little-endian.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::info;

use libshuru_core::{
    Connection, DatTrie, Dictionary, Error, LatticeNodeData, Result, SegmentGraph,
    SegmentGraphNodeId, TrieDictionary, WordNode, SYSTEM_DICT, UNKNOWN_WORD, USER_DICT,
};

/// Separator between code and word bytes; outside the printable ASCII
/// range valid for key codes.
pub const TABLE_SEPARATOR: u8 = 0x7f;

const TABLE_MAGIC: &[u8; 4] = b"STBD";
const TABLE_VERSION: u32 = 1;
const FLAG_BITS: u32 = 3;
const FLAG_MASK: u32 = (1 << FLAG_BITS) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TableFlag {
    /// Regular system data.
    None = 0,
    User = 1,
    Auto = 2,
    PinyinAssist = 3,
    Prompt = 4,
    ConstructRule = 5,
}

impl TableFlag {
    fn from_bits(bits: u32) -> TableFlag {
        match bits {
            1 => TableFlag::User,
            2 => TableFlag::Auto,
            3 => TableFlag::PinyinAssist,
            4 => TableFlag::Prompt,
            5 => TableFlag::ConstructRule,
            _ => TableFlag::None,
        }
    }
}

fn pack(index: u32, flag: TableFlag) -> u32 {
    (index << FLAG_BITS) | flag as u32
}

fn unpack(value: u32) -> (u32, TableFlag) {
    (value >> FLAG_BITS, TableFlag::from_bits(value & FLAG_MASK))
}

/// Header of a table definition.
#[derive(Debug, Clone, Default)]
pub struct TableMeta {
    /// Alphabet of valid code characters.
    pub key_codes: String,
    /// Maximum code length.
    pub length: usize,
    /// Key that switches to pinyin-assisted input.
    pub pinyin_key: Option<char>,
    /// Key prefixing prompt entries.
    pub prompt_key: Option<char>,
    /// Key prefixing phrase-construction entries.
    pub construct_phrase_key: Option<char>,
    /// Characters never accepted in codes.
    pub invalid_chars: String,
    /// Raw `[Rule]` lines, preserved but not interpreted here.
    pub rules: Vec<String>,
}

impl TableMeta {
    pub fn is_valid_code(&self, code: &str) -> bool {
        self.is_valid_code_chars(code)
            && (self.length == 0 || code.chars().count() <= self.length)
    }

    /// Alphabet membership alone; auto-learned phrase codes may exceed the
    /// per-word length limit.
    pub fn is_valid_code_chars(&self, code: &str) -> bool {
        !code.is_empty()
            && code.chars().all(|c| {
                c.is_ascii() && self.key_codes.contains(c) && !self.invalid_chars.contains(c)
            })
    }
}

#[derive(Debug)]
pub struct TableEntry {
    pub code: String,
    pub word: String,
    pub index: u32,
    pub flag: TableFlag,
}

#[derive(Debug, Default)]
pub struct TableDict {
    base: TrieDictionary<u32>,
    meta: TableMeta,
    next_index: u32,
}

impl TableDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn connect_changed(&self, f: impl Fn(&usize) + 'static) -> Connection {
        self.base.connect_changed(f)
    }

    fn make_key(code: &str, word: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(code.len() + 1 + word.len());
        key.extend_from_slice(code.as_bytes());
        key.push(TABLE_SEPARATOR);
        key.extend_from_slice(word.as_bytes());
        key
    }

    fn layer_for(flag: TableFlag) -> usize {
        match flag {
            TableFlag::User | TableFlag::Auto => USER_DICT,
            _ => SYSTEM_DICT,
        }
    }

    /// Insert a word. User and auto-learned entries land in the user
    /// layer, everything else in the system layer.
    pub fn add_word(&mut self, code: &str, word: &str, flag: TableFlag) -> Result<()> {
        if !code.is_ascii() || code.is_empty() {
            return Err(Error::invalid_argument(format!(
                "table code must be non-empty ASCII: {code:?}"
            )));
        }
        // Auto-learned phrase codes concatenate word codes, so only the
        // alphabet is enforced for them, not the per-word length.
        let valid = if flag == TableFlag::Auto {
            self.meta.is_valid_code_chars(code)
        } else {
            self.meta.is_valid_code(code)
        };
        if !self.meta.key_codes.is_empty() && !valid {
            return Err(Error::invalid_argument(format!(
                "code {code:?} not valid for this table"
            )));
        }
        let index = self.next_index;
        self.next_index += 1;
        let layer = Self::layer_for(flag);
        self.base
            .trie_mut(layer)?
            .set(&Self::make_key(code, word), pack(index, flag));
        self.base.emit_changed(layer);
        Ok(())
    }

    /// Remove a word from whichever layer holds it.
    pub fn remove_word(&mut self, code: &str, word: &str) -> Result<bool> {
        let key = Self::make_key(code, word);
        for layer in 0..self.base.dict_size() {
            if self.base.trie_mut(layer)?.erase(&key).is_some() {
                self.base.emit_changed(layer);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Exact-code candidates, stable insertion order.
    pub fn lookup(&self, code: &str) -> Vec<TableEntry> {
        let mut out = Vec::new();
        for trie in self.base.tries() {
            let mut pos = DatTrie::<u32>::root_pos();
            if !trie.traverse(code.as_bytes(), &mut pos).is_path() {
                continue;
            }
            if !trie.traverse(&[TABLE_SEPARATOR], &mut pos).is_path() {
                continue;
            }
            trie.foreach_at(pos, |value, len, state| {
                let word_bytes = trie.suffix(state, len);
                if let Ok(word) = std::str::from_utf8(&word_bytes) {
                    let (index, flag) = unpack(value);
                    out.push(TableEntry {
                        code: code.to_string(),
                        word: word.to_string(),
                        index,
                        flag,
                    });
                }
                true
            });
        }
        out.sort_by_key(|e| e.index);
        out
    }

    /// Every entry whose code starts with `code`.
    pub fn lookup_prefix(&self, code: &str) -> Vec<TableEntry> {
        let mut out = Vec::new();
        for trie in self.base.tries() {
            let mut pos = DatTrie::<u32>::root_pos();
            if !trie.traverse(code.as_bytes(), &mut pos).is_path() {
                continue;
            }
            trie.foreach_at(pos, |value, len, state| {
                let tail = trie.suffix(state, len);
                if let Some(sep) = tail.iter().position(|&b| b == TABLE_SEPARATOR) {
                    let rest = std::str::from_utf8(&tail[..sep]).ok();
                    let word = std::str::from_utf8(&tail[sep + 1..]).ok();
                    if let (Some(rest), Some(word)) = (rest, word) {
                        let (index, flag) = unpack(value);
                        out.push(TableEntry {
                            code: format!("{code}{rest}"),
                            word: word.to_string(),
                            index,
                            flag,
                        });
                    }
                }
                true
            });
        }
        out.sort_by_key(|e| e.index);
        out
    }

    /// True if some stored code starts with these bytes in any layer.
    pub fn has_code_path(&self, code: &[u8]) -> bool {
        self.base.tries().iter().any(|trie| {
            let mut pos = DatTrie::<u32>::root_pos();
            trie.traverse(code, &mut pos).is_path()
        })
    }

    /// Codes that produce `word` (reverse lookup over every layer).
    pub fn reverse_lookup(&self, word: &str) -> Vec<String> {
        let mut out = Vec::new();
        for trie in self.base.tries() {
            trie.foreach(|_, len, state| {
                let key = trie.suffix(state, len);
                if let Some(sep) = key.iter().position(|&b| b == TABLE_SEPARATOR) {
                    if &key[sep + 1..] == word.as_bytes() {
                        if let Ok(code) = std::str::from_utf8(&key[..sep]) {
                            out.push(code.to_string());
                        }
                    }
                }
                true
            });
        }
        out.sort();
        out.dedup();
        out
    }

    /// Parse the text table definition, replacing current contents.
    pub fn load_text<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => {
                    Error::invalid_format("table text is not valid UTF-8")
                }
                _ => Error::Io(e),
            })?;

        let mut meta = TableMeta::default();
        let mut trie = DatTrie::new();
        let mut next_index = 0u32;

        #[derive(PartialEq)]
        enum Section {
            Header,
            Rule,
            Data,
        }
        let mut section = Section::Header;
        for (lineno, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match line {
                "[Rule]" => {
                    section = Section::Rule;
                    continue;
                }
                "[Data]" => {
                    section = Section::Data;
                    continue;
                }
                _ => {}
            }
            match section {
                Section::Header => {
                    let (field, value) = line.split_once('=').ok_or_else(|| {
                        Error::invalid_format(format!(
                            "table line {}: expected FIELD=VALUE",
                            lineno + 1
                        ))
                    })?;
                    match field.trim() {
                        "KeyCode" => meta.key_codes = value.trim().to_string(),
                        "Length" => {
                            meta.length = value.trim().parse().map_err(|_| {
                                Error::invalid_format(format!(
                                    "table line {}: bad Length",
                                    lineno + 1
                                ))
                            })?
                        }
                        "Pinyin" => meta.pinyin_key = value.trim().chars().next(),
                        "Prompt" => meta.prompt_key = value.trim().chars().next(),
                        "ConstructPhrase" => {
                            meta.construct_phrase_key = value.trim().chars().next()
                        }
                        "InvalidChar" => meta.invalid_chars = value.trim().to_string(),
                        _ => {}
                    }
                }
                Section::Rule => meta.rules.push(line.to_string()),
                Section::Data => {
                    let mut parts = line.split_whitespace();
                    let (code, word) = match (parts.next(), parts.next()) {
                        (Some(c), Some(w)) => (c, w),
                        _ => {
                            return Err(Error::invalid_format(format!(
                                "table line {}: expected CODE WORD",
                                lineno + 1
                            )))
                        }
                    };
                    // Marker keys (prompt, construct, pinyin-assist) prefix
                    // the code and sit outside the key alphabet.
                    let first = code.chars().next();
                    let flag = if first.is_some() && first == meta.prompt_key {
                        TableFlag::Prompt
                    } else if first.is_some() && first == meta.construct_phrase_key {
                        TableFlag::ConstructRule
                    } else if first.is_some() && first == meta.pinyin_key {
                        TableFlag::PinyinAssist
                    } else {
                        TableFlag::None
                    };
                    if flag == TableFlag::None && !meta.is_valid_code(code) {
                        return Err(Error::invalid_format(format!(
                            "table line {}: code {code:?} not in key alphabet",
                            lineno + 1
                        )));
                    }
                    trie.set(&Self::make_key(code, word), pack(next_index, flag));
                    next_index += 1;
                }
            }
        }
        if meta.key_codes.is_empty() {
            return Err(Error::invalid_format("table has no KeyCode header"));
        }
        info!(words = trie.len(), "loaded table dictionary");
        self.meta = meta;
        self.next_index = next_index;
        self.base.replace_trie(SYSTEM_DICT, trie)?;
        self.base.clear(USER_DICT)?;
        Ok(())
    }

    pub fn save_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "KeyCode={}", self.meta.key_codes)?;
        writeln!(writer, "Length={}", self.meta.length)?;
        if let Some(c) = self.meta.pinyin_key {
            writeln!(writer, "Pinyin={c}")?;
        }
        if let Some(c) = self.meta.prompt_key {
            writeln!(writer, "Prompt={c}")?;
        }
        if let Some(c) = self.meta.construct_phrase_key {
            writeln!(writer, "ConstructPhrase={c}")?;
        }
        if !self.meta.invalid_chars.is_empty() {
            writeln!(writer, "InvalidChar={}", self.meta.invalid_chars)?;
        }
        if !self.meta.rules.is_empty() {
            writeln!(writer, "[Rule]")?;
            for rule in &self.meta.rules {
                writeln!(writer, "{rule}")?;
            }
        }
        writeln!(writer, "[Data]")?;
        let mut entries: Vec<TableEntry> = Vec::new();
        for trie in self.base.tries() {
            trie.foreach(|value, len, state| {
                let key = trie.suffix(state, len);
                if let Some(sep) = key.iter().position(|&b| b == TABLE_SEPARATOR) {
                    let code = std::str::from_utf8(&key[..sep]).ok();
                    let word = std::str::from_utf8(&key[sep + 1..]).ok();
                    if let (Some(code), Some(word)) = (code, word) {
                        let (index, flag) = unpack(value);
                        entries.push(TableEntry {
                            code: code.to_string(),
                            word: word.to_string(),
                            index,
                            flag,
                        });
                    }
                }
                true
            });
        }
        entries.sort_by_key(|e| e.index);
        for entry in entries {
            writeln!(writer, "{} {}", entry.code, entry.word)?;
        }
        Ok(())
    }

    /// Binary image: magic, version, header, then one double-array image
    /// per layer.
    pub fn save_binary<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(TABLE_MAGIC)?;
        writer.write_u32::<LittleEndian>(TABLE_VERSION)?;
        write_string(writer, &self.meta.key_codes)?;
        writer.write_u32::<LittleEndian>(self.meta.length as u32)?;
        write_opt_char(writer, self.meta.pinyin_key)?;
        write_opt_char(writer, self.meta.prompt_key)?;
        write_opt_char(writer, self.meta.construct_phrase_key)?;
        write_string(writer, &self.meta.invalid_chars)?;
        writer.write_u32::<LittleEndian>(self.meta.rules.len() as u32)?;
        for rule in &self.meta.rules {
            write_string(writer, rule)?;
        }
        writer.write_u32::<LittleEndian>(self.next_index)?;
        writer.write_u32::<LittleEndian>(self.base.dict_size() as u32)?;
        for trie in self.base.tries() {
            trie.save(writer)?;
        }
        Ok(())
    }

    pub fn load_binary<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::invalid_format("truncated table dictionary")
            } else {
                Error::Io(e)
            }
        })?;
        if &magic != TABLE_MAGIC {
            return Err(Error::invalid_format("bad table dictionary magic"));
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != TABLE_VERSION {
            return Err(Error::invalid_format(format!(
                "unsupported table dictionary version {version}"
            )));
        }
        let mut meta = TableMeta {
            key_codes: read_string(reader)?,
            length: reader.read_u32::<LittleEndian>()? as usize,
            pinyin_key: read_opt_char(reader)?,
            prompt_key: read_opt_char(reader)?,
            construct_phrase_key: read_opt_char(reader)?,
            invalid_chars: read_string(reader)?,
            rules: Vec::new(),
        };
        let rule_count = reader.read_u32::<LittleEndian>()?;
        for _ in 0..rule_count {
            meta.rules.push(read_string(reader)?);
        }
        let next_index = reader.read_u32::<LittleEndian>()?;
        let layers = reader.read_u32::<LittleEndian>()? as usize;
        if layers < 2 {
            return Err(Error::invalid_format("table image missing fixed layers"));
        }
        let mut tries = Vec::with_capacity(layers);
        for _ in 0..layers {
            tries.push(DatTrie::load(reader)?);
        }
        self.meta = meta;
        self.next_index = next_index;
        while self.base.dict_size() < layers {
            self.base.add_empty_dict();
        }
        for (idx, trie) in tries.into_iter().enumerate() {
            self.base.replace_trie(idx, trie)?;
        }
        Ok(())
    }
}

/// Penalty for matching a word by a prefix of its stored code (the code
/// is not finished yet), one decade like a pinyin wildcard.
const PARTIAL_CODE_COST: f32 = -1.0;

/// Auto-learned entries rank slightly below curated data of equal score.
fn flag_cost(flag: TableFlag) -> f32 {
    match flag {
        TableFlag::Auto => -0.5,
        _ => 0.0,
    }
}

fn entry_data(entry: &TableEntry) -> LatticeNodeData {
    LatticeNodeData::table(entry.flag as u8, entry.code.as_bytes())
}

impl Dictionary for TableDict {
    /// Table codes are short and matched exactly; there is nothing worth
    /// memoizing between keystrokes.
    type MatchHelper = ();

    fn match_prefix(
        &self,
        graph: &SegmentGraph,
        _helper: Option<&mut ()>,
        cb: &mut dyn FnMut(&[SegmentGraphNodeId], WordNode, f32, LatticeNodeData),
    ) {
        let end_offset = graph.size();
        for node in graph.iter() {
            for &to in node.next() {
                let to_node = match graph.node_at(to) {
                    Some(n) => n,
                    None => continue,
                };
                let path = [node.id(), to_node.id()];
                let segment = graph.segment(node.index(), to);

                let mut emitted = false;
                for entry in self.lookup(segment) {
                    // Prompt and construct entries are hints, not words.
                    if matches!(entry.flag, TableFlag::Prompt | TableFlag::ConstructRule) {
                        continue;
                    }
                    emitted = true;
                    cb(
                        &path,
                        WordNode::new(entry.word.as_str(), UNKNOWN_WORD),
                        flag_cost(entry.flag),
                        entry_data(&entry),
                    );
                }

                // A trailing segment with no exact match is an unfinished
                // code: offer the words it could still become.
                if !emitted && to == end_offset {
                    for entry in self.lookup_prefix(segment) {
                        if matches!(entry.flag, TableFlag::Prompt | TableFlag::ConstructRule) {
                            continue;
                        }
                        cb(
                            &path,
                            WordNode::new(entry.word.as_str(), UNKNOWN_WORD),
                            flag_cost(entry.flag) + PARTIAL_CODE_COST,
                            entry_data(&entry),
                        );
                    }
                }
            }
        }
    }
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    writer.write_u32::<LittleEndian>(s.len() as u32)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u32::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::invalid_format("truncated table dictionary")
        } else {
            Error::Io(e)
        }
    })?;
    String::from_utf8(buf).map_err(|_| Error::invalid_format("table string is not UTF-8"))
}

fn write_opt_char<W: Write>(writer: &mut W, c: Option<char>) -> Result<()> {
    writer.write_u32::<LittleEndian>(c.map(|c| c as u32).unwrap_or(0))?;
    Ok(())
}

fn read_opt_char<R: Read>(reader: &mut R) -> Result<Option<char>> {
    let raw = reader.read_u32::<LittleEndian>()?;
    if raw == 0 {
        Ok(None)
    } else {
        Ok(char::from_u32(raw))
    }
}

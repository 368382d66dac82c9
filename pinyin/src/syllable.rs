//! Pinyin syllable model: initials, finals, and the 2-byte code.
//!
//! A syllable is an (initial, final) pair; a full spelling of N syllables
//! encodes to 2N bytes. `Zero` marks the absent half (zero-initial
//! syllables like "er", or an initial typed without its final yet);
//! `Invalid` is the parse-failure sentinel and never appears in stored
//! keys.

/// Separator byte between the code block and the word bytes in dictionary
/// keys; one past the largest final discriminant.
pub const CODE_SEPARATOR: u8 = PinyinFinal::Zero as u8 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PinyinInitial {
    Invalid = 0,
    B = 1,
    P,
    M,
    F,
    D,
    T,
    N,
    L,
    G,
    K,
    H,
    J,
    Q,
    X,
    ZH,
    CH,
    SH,
    R,
    Z,
    C,
    S,
    Y,
    W,
    Zero,
}

impl PinyinInitial {
    pub const FIRST: u8 = PinyinInitial::B as u8;
    pub const LAST: u8 = PinyinInitial::Zero as u8;

    pub fn to_str(self) -> &'static str {
        match self {
            PinyinInitial::B => "b",
            PinyinInitial::P => "p",
            PinyinInitial::M => "m",
            PinyinInitial::F => "f",
            PinyinInitial::D => "d",
            PinyinInitial::T => "t",
            PinyinInitial::N => "n",
            PinyinInitial::L => "l",
            PinyinInitial::G => "g",
            PinyinInitial::K => "k",
            PinyinInitial::H => "h",
            PinyinInitial::J => "j",
            PinyinInitial::Q => "q",
            PinyinInitial::X => "x",
            PinyinInitial::ZH => "zh",
            PinyinInitial::CH => "ch",
            PinyinInitial::SH => "sh",
            PinyinInitial::R => "r",
            PinyinInitial::Z => "z",
            PinyinInitial::C => "c",
            PinyinInitial::S => "s",
            PinyinInitial::Y => "y",
            PinyinInitial::W => "w",
            PinyinInitial::Zero | PinyinInitial::Invalid => "",
        }
    }

    pub fn from_str(s: &str) -> PinyinInitial {
        match s {
            "b" => PinyinInitial::B,
            "p" => PinyinInitial::P,
            "m" => PinyinInitial::M,
            "f" => PinyinInitial::F,
            "d" => PinyinInitial::D,
            "t" => PinyinInitial::T,
            "n" => PinyinInitial::N,
            "l" => PinyinInitial::L,
            "g" => PinyinInitial::G,
            "k" => PinyinInitial::K,
            "h" => PinyinInitial::H,
            "j" => PinyinInitial::J,
            "q" => PinyinInitial::Q,
            "x" => PinyinInitial::X,
            "zh" => PinyinInitial::ZH,
            "ch" => PinyinInitial::CH,
            "sh" => PinyinInitial::SH,
            "r" => PinyinInitial::R,
            "z" => PinyinInitial::Z,
            "c" => PinyinInitial::C,
            "s" => PinyinInitial::S,
            "y" => PinyinInitial::Y,
            "w" => PinyinInitial::W,
            "" => PinyinInitial::Zero,
            _ => PinyinInitial::Invalid,
        }
    }

    pub fn from_byte(b: u8) -> PinyinInitial {
        const TABLE: [PinyinInitial; 24] = [
            PinyinInitial::B,
            PinyinInitial::P,
            PinyinInitial::M,
            PinyinInitial::F,
            PinyinInitial::D,
            PinyinInitial::T,
            PinyinInitial::N,
            PinyinInitial::L,
            PinyinInitial::G,
            PinyinInitial::K,
            PinyinInitial::H,
            PinyinInitial::J,
            PinyinInitial::Q,
            PinyinInitial::X,
            PinyinInitial::ZH,
            PinyinInitial::CH,
            PinyinInitial::SH,
            PinyinInitial::R,
            PinyinInitial::Z,
            PinyinInitial::C,
            PinyinInitial::S,
            PinyinInitial::Y,
            PinyinInitial::W,
            PinyinInitial::Zero,
        ];
        TABLE
            .get((b as usize).wrapping_sub(Self::FIRST as usize))
            .copied()
            .unwrap_or(PinyinInitial::Invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PinyinFinal {
    Invalid = 0,
    A = 1,
    AI,
    AN,
    ANG,
    AO,
    E,
    EI,
    EN,
    ENG,
    ER,
    O,
    ONG,
    OU,
    I,
    IA,
    IE,
    IAO,
    IU,
    IAN,
    IN,
    IANG,
    ING,
    IONG,
    U,
    UA,
    UO,
    UAI,
    UI,
    UAN,
    UN,
    UANG,
    V,
    UE,
    VE,
    NG,
    Zero,
}

impl PinyinFinal {
    pub const FIRST: u8 = PinyinFinal::A as u8;
    pub const LAST: u8 = PinyinFinal::Zero as u8;
    /// Largest final that can appear in a stored key.
    pub const LAST_CONCRETE: u8 = PinyinFinal::NG as u8;

    pub fn to_str(self) -> &'static str {
        match self {
            PinyinFinal::A => "a",
            PinyinFinal::AI => "ai",
            PinyinFinal::AN => "an",
            PinyinFinal::ANG => "ang",
            PinyinFinal::AO => "ao",
            PinyinFinal::E => "e",
            PinyinFinal::EI => "ei",
            PinyinFinal::EN => "en",
            PinyinFinal::ENG => "eng",
            PinyinFinal::ER => "er",
            PinyinFinal::O => "o",
            PinyinFinal::ONG => "ong",
            PinyinFinal::OU => "ou",
            PinyinFinal::I => "i",
            PinyinFinal::IA => "ia",
            PinyinFinal::IE => "ie",
            PinyinFinal::IAO => "iao",
            PinyinFinal::IU => "iu",
            PinyinFinal::IAN => "ian",
            PinyinFinal::IN => "in",
            PinyinFinal::IANG => "iang",
            PinyinFinal::ING => "ing",
            PinyinFinal::IONG => "iong",
            PinyinFinal::U => "u",
            PinyinFinal::UA => "ua",
            PinyinFinal::UO => "uo",
            PinyinFinal::UAI => "uai",
            PinyinFinal::UI => "ui",
            PinyinFinal::UAN => "uan",
            PinyinFinal::UN => "un",
            PinyinFinal::UANG => "uang",
            PinyinFinal::V => "v",
            PinyinFinal::UE => "ue",
            PinyinFinal::VE => "ve",
            PinyinFinal::NG => "ng",
            PinyinFinal::Zero | PinyinFinal::Invalid => "",
        }
    }

    pub fn from_str(s: &str) -> PinyinFinal {
        match s {
            "a" => PinyinFinal::A,
            "ai" => PinyinFinal::AI,
            "an" => PinyinFinal::AN,
            "ang" => PinyinFinal::ANG,
            "ao" => PinyinFinal::AO,
            "e" => PinyinFinal::E,
            "ei" => PinyinFinal::EI,
            "en" => PinyinFinal::EN,
            "eng" => PinyinFinal::ENG,
            "er" => PinyinFinal::ER,
            "o" => PinyinFinal::O,
            "ong" => PinyinFinal::ONG,
            "ou" => PinyinFinal::OU,
            "i" => PinyinFinal::I,
            "ia" => PinyinFinal::IA,
            "ie" => PinyinFinal::IE,
            "iao" => PinyinFinal::IAO,
            "iu" => PinyinFinal::IU,
            "ian" => PinyinFinal::IAN,
            "in" => PinyinFinal::IN,
            "iang" => PinyinFinal::IANG,
            "ing" => PinyinFinal::ING,
            "iong" => PinyinFinal::IONG,
            "u" => PinyinFinal::U,
            "ua" => PinyinFinal::UA,
            "uo" => PinyinFinal::UO,
            "uai" => PinyinFinal::UAI,
            "ui" => PinyinFinal::UI,
            "uan" => PinyinFinal::UAN,
            "un" => PinyinFinal::UN,
            "uang" => PinyinFinal::UANG,
            "v" => PinyinFinal::V,
            "ue" => PinyinFinal::UE,
            "ve" => PinyinFinal::VE,
            "ng" => PinyinFinal::NG,
            "" => PinyinFinal::Zero,
            _ => PinyinFinal::Invalid,
        }
    }

    pub fn from_byte(b: u8) -> PinyinFinal {
        const TABLE: [PinyinFinal; 36] = [
            PinyinFinal::A,
            PinyinFinal::AI,
            PinyinFinal::AN,
            PinyinFinal::ANG,
            PinyinFinal::AO,
            PinyinFinal::E,
            PinyinFinal::EI,
            PinyinFinal::EN,
            PinyinFinal::ENG,
            PinyinFinal::ER,
            PinyinFinal::O,
            PinyinFinal::ONG,
            PinyinFinal::OU,
            PinyinFinal::I,
            PinyinFinal::IA,
            PinyinFinal::IE,
            PinyinFinal::IAO,
            PinyinFinal::IU,
            PinyinFinal::IAN,
            PinyinFinal::IN,
            PinyinFinal::IANG,
            PinyinFinal::ING,
            PinyinFinal::IONG,
            PinyinFinal::U,
            PinyinFinal::UA,
            PinyinFinal::UO,
            PinyinFinal::UAI,
            PinyinFinal::UI,
            PinyinFinal::UAN,
            PinyinFinal::UN,
            PinyinFinal::UANG,
            PinyinFinal::V,
            PinyinFinal::UE,
            PinyinFinal::VE,
            PinyinFinal::NG,
            PinyinFinal::Zero,
        ];
        TABLE
            .get((b as usize).wrapping_sub(Self::FIRST as usize))
            .copied()
            .unwrap_or(PinyinFinal::Invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinyinSyllable {
    pub initial: PinyinInitial,
    pub fin: PinyinFinal,
}

impl PinyinSyllable {
    pub fn new(initial: PinyinInitial, fin: PinyinFinal) -> Self {
        Self { initial, fin }
    }

    pub fn to_string(self) -> String {
        format!("{}{}", self.initial.to_str(), self.fin.to_str())
    }
}

/// Fuzzy-equivalence switches. Each bit gates one hand-tuned confusion
/// class; `INNER` additionally enables long-syllable inner segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FuzzyFlags(u32);

impl FuzzyFlags {
    pub const NONE: FuzzyFlags = FuzzyFlags(0);
    pub const C_CH: FuzzyFlags = FuzzyFlags(1);
    pub const S_SH: FuzzyFlags = FuzzyFlags(1 << 1);
    pub const Z_ZH: FuzzyFlags = FuzzyFlags(1 << 2);
    pub const F_H: FuzzyFlags = FuzzyFlags(1 << 3);
    pub const L_N: FuzzyFlags = FuzzyFlags(1 << 4);
    pub const AN_ANG: FuzzyFlags = FuzzyFlags(1 << 5);
    pub const EN_ENG: FuzzyFlags = FuzzyFlags(1 << 6);
    pub const IAN_IANG: FuzzyFlags = FuzzyFlags(1 << 7);
    pub const IN_ING: FuzzyFlags = FuzzyFlags(1 << 8);
    pub const U_OU: FuzzyFlags = FuzzyFlags(1 << 9);
    pub const UAN_UANG: FuzzyFlags = FuzzyFlags(1 << 10);
    pub const V_U: FuzzyFlags = FuzzyFlags(1 << 11);
    pub const VE_UE: FuzzyFlags = FuzzyFlags(1 << 12);
    pub const INNER: FuzzyFlags = FuzzyFlags(1 << 13);

    pub const ALL: FuzzyFlags = FuzzyFlags((1 << 14) - 1);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn union(self, other: FuzzyFlags) -> FuzzyFlags {
        FuzzyFlags(self.0 | other.0)
    }

    pub fn contains(self, other: FuzzyFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when an entry tagged `entry_flags` is acceptable under these
    /// enabled flags (untagged entries always are).
    pub fn allows(self, entry_flags: FuzzyFlags) -> bool {
        self.contains(entry_flags)
    }

    /// Parse a config name like "an_ang", "c_ch" or "inner".
    pub fn from_name(name: &str) -> Option<FuzzyFlags> {
        Some(match name {
            "c_ch" => Self::C_CH,
            "s_sh" => Self::S_SH,
            "z_zh" => Self::Z_ZH,
            "f_h" => Self::F_H,
            "l_n" => Self::L_N,
            "an_ang" => Self::AN_ANG,
            "en_eng" => Self::EN_ENG,
            "ian_iang" => Self::IAN_IANG,
            "in_ing" => Self::IN_ING,
            "u_ou" => Self::U_OU,
            "uan_uang" => Self::UAN_UANG,
            "v_u" => Self::V_U,
            "ve_ue" => Self::VE_UE,
            "inner" => Self::INNER,
            _ => return None,
        })
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> FuzzyFlags {
        names
            .iter()
            .filter_map(|n| Self::from_name(n.as_ref()))
            .fold(Self::NONE, FuzzyFlags::union)
    }
}

impl std::ops::BitOr for FuzzyFlags {
    type Output = FuzzyFlags;
    fn bitor(self, rhs: FuzzyFlags) -> FuzzyFlags {
        self.union(rhs)
    }
}

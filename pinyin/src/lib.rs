//! libshuru-pinyin
//!
//! Pinyin front-end over the shared decoding core: the syllable tables
//! and fuzzy rules, the user-input segmenter, the layered pinyin
//! dictionary with its incremental match caches, the editing context, and
//! shuangpin keyboard profiles.
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::rc::Rc;
//! use libshuru_core::{LanguageModelBuilder, UserLanguageModel, SYSTEM_DICT};
//! use libshuru_pinyin::{PinyinContext, PinyinDictFormat, PinyinDictionary, PinyinIme};
//!
//! let mut dict = PinyinDictionary::new();
//! let mut file = std::fs::File::open("system.dict").unwrap();
//! dict.load(SYSTEM_DICT, &mut file, PinyinDictFormat::Binary).unwrap();
//! let model = UserLanguageModel::new(LanguageModelBuilder::new().build());
//! let ime = Rc::new(PinyinIme::new(dict, model));
//! let mut context = PinyinContext::new(ime);
//! context.type_str("nihao").unwrap();
//! println!("{}", context.sentence());
//! ```

pub mod data;
pub mod dict;
pub mod encoder;
pub mod ime;
pub mod match_state;
pub mod prediction;
pub mod shuangpin;
pub mod syllable;

mod context;

pub use context::PinyinContext;
pub use dict::{PinyinDictFormat, PinyinDictionary};
pub use encoder::{PinyinEncoder, SyllableReadings};
pub use ime::PinyinIme;
pub use match_state::PinyinMatchState;
pub use prediction::{PinyinPrediction, PinyinPredictionSource};
pub use shuangpin::{ShuangpinProfile, ShuangpinScheme};
pub use syllable::{FuzzyFlags, PinyinFinal, PinyinInitial, PinyinSyllable, CODE_SEPARATOR};

//! libshuru-core
//!
//! Core decoding pipeline shared by the language-specific input engines
//! (pinyin, table): double-array trie storage, the segment graph/lattice
//! pair, the beam Viterbi decoder, the back-off language model with its
//! user-history wrapper, and the supporting caches and buffers.
//!
//! The crate is pure computation over in-memory structures; `load`/`save`
//! operate on caller-provided streams and nothing here touches the
//! filesystem except the explicit config helpers.
//!
//! Everything is single-threaded by design: contexts, dictionaries and
//! models are meant to live on the host's input thread. Mutations
//! (dictionary edits, history learning) must not race an in-flight decode.

pub mod config;
pub mod decoder;
pub mod dictionary;
pub mod error;
pub mod history_bigram;
pub mod input_buffer;
pub mod language_model;
pub mod lattice;
pub mod lru;
pub mod prediction;
pub mod segment_graph;
pub mod signal;
pub mod trie;
pub mod user_model;

pub use config::{DecoderConfig, EngineConfig};
pub use decoder::{DecodeParams, Decoder, Dictionary, BEAM_SIZE_DEFAULT, FRAME_SIZE_DEFAULT};
pub use dictionary::{TrieDictionary, SYSTEM_DICT, USER_DICT};
pub use error::{Error, Result};
pub use history_bigram::{HistoryBigram, HistoryConfig, PoolParam};
pub use input_buffer::InputBuffer;
pub use language_model::{
    LanguageModel, LanguageModelBase, LanguageModelBuilder, State, WordIndex, BOS_WORD, EOS_WORD,
    UNKNOWN_WORD,
};
pub use lattice::{
    Lattice, LatticeNode, LatticeNodeData, SentenceResult, SentenceWord, WordNode, DATA_NONE,
    DATA_PINYIN, DATA_TABLE,
};
pub use lru::{LruMap, DEFAULT_LRU_CAPACITY};
pub use prediction::Prediction;
pub use segment_graph::{SegmentGraph, SegmentGraphNode, SegmentGraphNodeId};
pub use signal::{Connection, Signal};
pub use trie::{DatTrie, TraverseResult, TrieValue};
pub use user_model::{UserLanguageModel, USER_STATE_SIZE};

//! Runtime options for table-based input.

use serde::{Deserialize, Serialize};

/// How committed phrases feed back into the dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TableLearning {
    #[default]
    None,
    /// Record newly committed phrases as auto-learned entries.
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOptions {
    pub learning: TableLearning,
    /// Commit automatically once a unique match reaches this code length.
    pub auto_select: bool,
    pub auto_select_length: usize,
    /// Keep the raw code visible in the preedit instead of the match.
    pub commit_raw_input: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            learning: TableLearning::None,
            auto_select: false,
            auto_select_length: 0,
            commit_raw_input: false,
        }
    }
}

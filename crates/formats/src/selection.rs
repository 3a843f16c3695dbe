use serde::{Deserialize, Serialize};
use viewport::selection::{SELECTION_NEGATIVE, SELECTION_POSITIVE, SelectionStore};

use crate::pretty::{PrettyOptions, to_string_pretty_compact};

pub const SELECTION_FORMAT_VERSION: &str = "1.7";
pub const SEED_INFO_VERSION: &str = "0.1";

#[derive(Debug)]
pub enum SelectionError {
    Json(serde_json::Error),
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::Json(e) => write!(f, "selection document: {e}"),
        }
    }
}

impl std::error::Error for SelectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SelectionError::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for SelectionError {
    fn from(e: serde_json::Error) -> Self {
        SelectionError::Json(e)
    }
}

/// Chunks excluded from the search, kept under their own key so the text
/// format reads as `negative.slimeChunks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeSelection {
    #[serde(default)]
    pub slime_chunks: Vec<[i64; 2]>,
}

/// The selection persistence document shown in (and loaded from) the
/// selection text area.
///
/// The pretty-compact rendering is purely cosmetic; the only contract on
/// load is valid JSON with these keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDocument {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_info: Option<String>,
    #[serde(default)]
    pub slime_chunks: Vec<[i64; 2]>,
    #[serde(default)]
    pub negative: NegativeSelection,
}

impl Default for SelectionDocument {
    fn default() -> Self {
        Self {
            version: SELECTION_FORMAT_VERSION.to_string(),
            seed_info: Some(SEED_INFO_VERSION.to_string()),
            slime_chunks: Vec::new(),
            negative: NegativeSelection::default(),
        }
    }
}

impl SelectionDocument {
    /// Snapshot of a selection store's positive and negative cells.
    pub fn from_selection(selection: &SelectionStore) -> Self {
        Self {
            slime_chunks: selection.cells_with(SELECTION_POSITIVE),
            negative: NegativeSelection {
                slime_chunks: selection.cells_with(SELECTION_NEGATIVE),
            },
            ..Self::default()
        }
    }

    /// Replaces the store's contents with this document's cells.
    pub fn apply_to(&self, selection: &mut SelectionStore) {
        selection.clear();
        selection.set_all(SELECTION_POSITIVE, &self.slime_chunks);
        selection.set_all(SELECTION_NEGATIVE, &self.negative.slime_chunks);
    }

    /// Parses the text area contents. On error the caller keeps its
    /// previous state; nothing is partially applied.
    pub fn from_json(text: &str) -> Result<Self, SelectionError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_pretty_json(&self, max_length: usize) -> Result<String, SelectionError> {
        let value = serde_json::to_value(self)?;
        Ok(to_string_pretty_compact(
            &value,
            &PrettyOptions::with_max_length(max_length),
        ))
    }
}

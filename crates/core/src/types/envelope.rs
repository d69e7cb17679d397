//! Uniform result envelope returned to the tool-calling layer.
//!
//! Every search produces exactly one envelope, in one of two shapes:
//!
//! ```json
//! {"results": [...], "row_count": 2, "columns": ["product_name", ...]}
//! {"error": "...", "results": [], "row_count": 0, "columns": []}
//! ```
//!
//! A search that matched nothing is a success with an empty result set and a
//! human-readable `message`, never an error. Building an envelope is pure:
//! no I/O, no logging, and rendering to text cannot fail.

use serde::{Deserialize, Serialize};

use super::product::{PRODUCT_COLUMNS, ProductMatch};

/// Note attached to a successful search that matched no products.
pub const NO_RESULTS_MESSAGE: &str = "The query returned no results. Try a different question.";

/// Rendered when serialization itself fails; always valid JSON.
const SERIALIZATION_FAILURE_JSON: &str =
    r#"{"error":"failed to render result envelope","results":[],"row_count":0,"columns":[]}"#;

/// The response shape for every search call.
///
/// Construct with [`ResultEnvelope::from_rows`] or [`ResultEnvelope::failure`]
/// so that `row_count` always matches `results` and a failure never carries
/// row data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultEnvelope {
    /// The search could not be completed.
    Failure {
        /// Readable description of the failure category and cause.
        error: String,
        /// Always empty.
        results: Vec<ProductMatch>,
        /// Always zero.
        row_count: usize,
        /// Always empty.
        columns: Vec<String>,
    },
    /// The search ran; `results` may be empty.
    Success {
        /// Matched products, ordered by product name.
        results: Vec<ProductMatch>,
        /// Number of entries in `results`.
        row_count: usize,
        /// Column names of each result row; empty when nothing matched.
        columns: Vec<String>,
        /// Set only when nothing matched.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ResultEnvelope {
    /// Build a success envelope from the rows a search returned.
    ///
    /// An empty row set yields the "no results" shape.
    #[must_use]
    pub fn from_rows(rows: Vec<ProductMatch>) -> Self {
        if rows.is_empty() {
            return Self::no_results();
        }

        Self::Success {
            row_count: rows.len(),
            results: rows,
            columns: PRODUCT_COLUMNS.iter().map(ToString::to_string).collect(),
            message: None,
        }
    }

    /// A success envelope for a search that matched nothing.
    #[must_use]
    pub fn no_results() -> Self {
        Self::Success {
            results: Vec::new(),
            row_count: 0,
            columns: Vec::new(),
            message: Some(NO_RESULTS_MESSAGE.to_string()),
        }
    }

    /// An error envelope carrying only the failure description.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            results: Vec::new(),
            row_count: 0,
            columns: Vec::new(),
        }
    }

    /// Returns `true` for the error shape.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// The failure description, if this is an error envelope.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error, .. } => Some(error),
            Self::Success { .. } => None,
        }
    }

    /// The result rows (empty for failures).
    #[must_use]
    pub fn results(&self) -> &[ProductMatch] {
        match self {
            Self::Failure { results, .. } | Self::Success { results, .. } => results,
        }
    }

    /// The reported row count.
    #[must_use]
    pub const fn row_count(&self) -> usize {
        match self {
            Self::Failure { row_count, .. } | Self::Success { row_count, .. } => *row_count,
        }
    }

    /// The reported column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Failure { columns, .. } | Self::Success { columns, .. } => columns,
        }
    }

    /// Render the envelope as JSON text.
    ///
    /// Result sets are pretty-printed for readability; short documents are
    /// compact. Never fails: a serialization error renders a fixed error
    /// document instead.
    #[must_use]
    pub fn to_json(&self) -> String {
        let rendered = if self.row_count() > 0 {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.unwrap_or_else(|_| SERIALIZATION_FAILURE_JSON.to_string())
    }
}

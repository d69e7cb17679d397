//! Search request types.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::identity::RlsUserId;

/// Row limit for a single search, clamped to `1..=100`.
///
/// Out-of-range input is never an error: anything above the ceiling becomes
/// the ceiling and anything below one (including negatives) becomes one.
///
/// ## Examples
///
/// ```
/// use zava_core::MaxRows;
///
/// assert_eq!(MaxRows::clamped(500).get(), 100);
/// assert_eq!(MaxRows::clamped(0).get(), 1);
/// assert_eq!(MaxRows::clamped(-3).get(), 1);
/// assert_eq!(MaxRows::clamped(20).get(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaxRows(i64);

impl MaxRows {
    /// Smallest effective row limit.
    pub const MIN: i64 = 1;
    /// Largest effective row limit.
    pub const MAX: i64 = 100;
    /// Row limit used when the caller does not supply one.
    pub const DEFAULT: Self = Self(20);

    /// Clamp any requested row count into `MIN..=MAX`.
    #[must_use]
    pub const fn clamped(requested: i64) -> Self {
        if requested < Self::MIN {
            Self(Self::MIN)
        } else if requested > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(requested)
        }
    }

    /// Get the effective row limit.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Default for MaxRows {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for MaxRows {
    fn from(requested: i64) -> Self {
        Self::clamped(requested)
    }
}

impl fmt::Display for MaxRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product search: name substring, row limit, and caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Text matched case-insensitively against product name and description.
    pub product_name: String,
    /// Effective row limit (already clamped).
    pub max_rows: MaxRows,
    /// Identity bound into the session before the query runs.
    pub identity: RlsUserId,
}

impl SearchRequest {
    /// Create a request, clamping `max_rows` into range.
    #[must_use]
    pub fn new(
        product_name: impl Into<String>,
        max_rows: i64,
        identity: impl Into<RlsUserId>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            max_rows: MaxRows::from(max_rows),
            identity: identity.into(),
        }
    }

    /// `ILIKE` pattern matching the product name as a literal substring.
    ///
    /// `%`, `_` and `\` in the caller's text are escaped so they match
    /// themselves rather than acting as wildcards.
    #[must_use]
    pub fn name_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.product_name.len() + 2);
        pattern.push('%');
        for c in self.product_name.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

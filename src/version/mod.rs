//! Version range parsing for pack format numbers.
//!
//! Packages declare which pack-format versions their content supports using
//! small range expressions (`"*"`, `"48"`, `"10-20"`, `">=57"`, ...). This
//! module resolves those expressions into inclusive integer bounds that the
//! overlay entries of the output descriptor are built from.
//!
//! The grammar is load-bearing for game compatibility and is fixed:
//!
//! | expression | min | max |
//! |------------|-----|-----|
//! | `<=N`      | 0   | N |
//! | `<N`       | 0   | N-1 |
//! | `>=N`      | N   | sentinel |
//! | `>N`       | N+1 | sentinel |
//! | `A-B`      | A   | B |
//! | `*`        | 0   | sentinel |
//! | `N`        | N   | N |
//!
//! The sentinel is [`FORMAT_SENTINEL`]: the descriptor format wants a finite
//! integer even for "no upper bound". Anything that does not match the
//! grammar, or that would produce an empty range, is rejected with
//! [`DpmError::InvalidFormatRange`] so a bad manifest fails validation
//! instead of leaking a nonsense bound into the output.

use crate::constants::FORMAT_SENTINEL;
use crate::core::DpmError;

/// An inclusive pack-format range resolved from a range expression.
///
/// Invariant: `0 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatRange {
    /// Lowest format version included.
    pub min: i64,
    /// Highest format version included; [`FORMAT_SENTINEL`] when the
    /// expression had no upper bound.
    pub max: i64,
}

impl FormatRange {
    /// Resolve a range expression into inclusive bounds.
    ///
    /// # Errors
    ///
    /// Returns [`DpmError::InvalidFormatRange`] for expressions that do not
    /// match the grammar, contain non-numeric bounds, or describe an empty
    /// range (e.g. `"20-10"` or `"<0"`).
    pub fn resolve(expr: &str) -> Result<Self, DpmError> {
        let expr = expr.trim();
        let invalid = || DpmError::InvalidFormatRange {
            expr: expr.to_string(),
        };

        let range = if let Some(rest) = expr.strip_prefix("<=") {
            Self {
                min: 0,
                max: parse_format(rest).ok_or_else(invalid)?,
            }
        } else if let Some(rest) = expr.strip_prefix('<') {
            Self {
                min: 0,
                max: parse_format(rest).ok_or_else(invalid)? - 1,
            }
        } else if let Some(rest) = expr.strip_prefix(">=") {
            Self {
                min: parse_format(rest).ok_or_else(invalid)?,
                max: FORMAT_SENTINEL,
            }
        } else if let Some(rest) = expr.strip_prefix('>') {
            Self {
                min: parse_format(rest).ok_or_else(invalid)? + 1,
                max: FORMAT_SENTINEL,
            }
        } else if expr == "*" {
            Self {
                min: 0,
                max: FORMAT_SENTINEL,
            }
        } else if let Some((low, high)) = expr.split_once('-') {
            Self {
                min: parse_format(low).ok_or_else(invalid)?,
                max: parse_format(high).ok_or_else(invalid)?,
            }
        } else {
            let exact = parse_format(expr).ok_or_else(invalid)?;
            Self {
                min: exact,
                max: exact,
            }
        };

        if range.min < 0 || range.min > range.max {
            return Err(invalid());
        }
        Ok(range)
    }
}

fn parse_format(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

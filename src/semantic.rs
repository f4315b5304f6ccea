//! Scoring seam for matching a query against symbol names.
//!
//! The engine only needs a score and a threshold; fuzzy, camelCase, and
//! stem-aware scorers plug in behind this trait. The built-in default is
//! plain containment in either direction.

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Scores how well a query matches a symbol name, in `[0.0, 1.0]`.
pub trait SemanticScorer: Send + Sync {
    fn score(&self, query: &str, symbol_name: &str) -> f64;

    /// Minimum score at which a symbol counts as matching the query.
    fn min_score(&self) -> f64 {
        0.6
    }
}

// ---------------------------------------------------------------------------
// Default scorer
// ---------------------------------------------------------------------------

/// Case-insensitive substring containment in either direction.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainmentScorer;

impl SemanticScorer for ContainmentScorer {
    fn score(&self, query: &str, symbol_name: &str) -> f64 {
        if query.is_empty() || symbol_name.is_empty() {
            return 0.0;
        }
        let q = query.to_ascii_lowercase();
        let s = symbol_name.to_ascii_lowercase();
        if q == s {
            1.0
        } else if s.contains(&q) || q.contains(&s) {
            0.8
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Bounded LRU of compiled regexes keyed by `(pattern, flags)`.
//!
//! Every pattern compiles with multiline semantics so `^`/`$` bind to line
//! boundaries. Capacity is a construction parameter; the engine default is
//! large enough that interactive sessions never evict.

use crate::error::EngineError;
use lru::LruCache;
use parking_lot::Mutex;
use regex::bytes::{Regex, RegexBuilder};
use std::num::NonZeroUsize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    pattern: String,
    case_insensitive: bool,
}

pub struct RegexCache {
    inner: Mutex<LruCache<CacheKey, Arc<Regex>>>,
}

impl RegexCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self { inner: Mutex::new(LruCache::new(cap)) }
    }

    /// Compile (or fetch) a multiline byte regex.
    pub fn compile(
        &self,
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<Arc<Regex>, EngineError> {
        let key = CacheKey { pattern: pattern.to_string(), case_insensitive };
        if let Some(re) = self.inner.lock().get(&key) {
            return Ok(Arc::clone(re));
        }
        let compiled = RegexBuilder::new(pattern)
            .multi_line(true)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| EngineError::InvalidRegex {
                pattern: pattern.to_string(),
                detail: e.to_string(),
            })?;
        let re = Arc::new(compiled);
        self.inner.lock().put(key, Arc::clone(&re));
        Ok(re)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

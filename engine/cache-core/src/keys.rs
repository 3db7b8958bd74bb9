//! Deterministic cache-key construction from named templates.
//!
//! Keys are built by substituting `{param}` placeholders in a fixed,
//! compile-time-known pattern table. Every relevant entity id appears in the
//! template verbatim, so distinct (entity, scope) pairs never collide. Keys
//! carry no randomness and no time component; time-dependence lives only in
//! the TTL.

use crate::error::{CacheError, Result};
use std::collections::HashMap;

/// Builds cache keys from a static table of named `{param}` templates.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    patterns: HashMap<&'static str, &'static str>,
}

impl KeyBuilder {
    /// Create a builder from a pattern table of (name, template) pairs.
    pub fn new(patterns: &[(&'static str, &'static str)]) -> Self {
        Self { patterns: patterns.iter().copied().collect() }
    }

    /// Build the key for a named pattern, substituting every placeholder.
    ///
    /// Fails on an unknown pattern name or an unsubstituted placeholder;
    /// a partially-built key must never reach the cache store.
    pub fn build(&self, pattern: &str, params: &[(&str, String)]) -> Result<String> {
        let template = self
            .patterns
            .get(pattern)
            .ok_or_else(|| CacheError::UnknownPattern(pattern.to_string()))?;

        let mut key = (*template).to_string();
        for (name, value) in params {
            key = key.replace(&format!("{{{name}}}"), value);
        }

        if let Some(start) = key.find('{') {
            let rest = &key[start + 1..];
            let param = rest.split('}').next().unwrap_or(rest).to_string();
            return Err(CacheError::MissingParam { pattern: pattern.to_string(), param });
        }

        Ok(key)
    }

    /// Whether the builder knows a pattern by this name.
    pub fn has_pattern(&self, pattern: &str) -> bool {
        self.patterns.contains_key(pattern)
    }
}

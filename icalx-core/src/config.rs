//! Parser configuration (§6): the knobs a caller can set before parsing.
//! Builder-style `with_*` methods, in the shape of the teacher's property
//! builders (e.g. `redical_ical`'s per-property `new`/`with_*` helpers).

use std::collections::HashSet;

use icalx_syntax::security::SecurityGate;

#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub strict: bool,
    pub max_depth: usize,
    pub allowed_schemes: HashSet<String>,
    pub max_data_uri_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let gate = SecurityGate::default();

        Self {
            strict: true,
            max_depth: gate.max_depth,
            allowed_schemes: gate.allowed_schemes,
            max_data_uri_size: gate.max_data_uri_size,
        }
    }
}

impl ParserConfig {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_allowed_schemes(mut self, allowed_schemes: HashSet<String>) -> Self {
        self.allowed_schemes = allowed_schemes;
        self
    }

    pub fn with_max_data_uri_size(mut self, max_data_uri_size: usize) -> Self {
        self.max_data_uri_size = max_data_uri_size;
        self
    }

    pub fn security_gate(&self) -> SecurityGate {
        SecurityGate::new(self.max_depth, self.allowed_schemes.clone(), self.max_data_uri_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_defaults() {
        let config = ParserConfig::default();
        assert!(config.strict);
        assert_eq!(config.max_depth, 100);
        assert_eq!(config.max_data_uri_size, 1_048_576);
        assert!(config.allowed_schemes.contains("https"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ParserConfig::default().with_strict(false).with_max_depth(5);
        assert!(!config.strict);
        assert_eq!(config.max_depth, 5);
    }
}

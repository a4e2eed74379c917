//! Named analyzers available to an index.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::config::{AnalyzerConfig, PRESET_NAMES};
use crate::error::{QuarryError, Result};

/// Maps analyzer names to built analyzers: the presets plus any custom
/// definitions, which may shadow a preset name.
#[derive(Debug, Clone)]
pub struct AnalyzerRegistry {
    analyzers: BTreeMap<String, Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// A registry holding only the presets.
    pub fn with_presets() -> Result<Self> {
        let mut analyzers: BTreeMap<String, Arc<dyn Analyzer>> = BTreeMap::new();
        for name in PRESET_NAMES {
            if let Some(config) = AnalyzerConfig::preset(name) {
                analyzers.insert(name.to_string(), Arc::new(config.build(name)?));
            }
        }
        Ok(AnalyzerRegistry { analyzers })
    }

    /// The presets plus the given custom analyzers.
    pub fn from_configs(custom: &BTreeMap<String, AnalyzerConfig>) -> Result<Self> {
        let mut registry = Self::with_presets()?;
        for (name, config) in custom {
            registry.register(name, Arc::new(config.build(name)?));
        }
        Ok(registry)
    }

    pub fn register<S: Into<String>>(&mut self, name: S, analyzer: Arc<dyn Analyzer>) {
        self.analyzers.insert(name.into(), analyzer);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Analyzer>> {
        self.analyzers
            .get(name)
            .cloned()
            .ok_or_else(|| QuarryError::analysis(format!("unknown analyzer '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.analyzers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.analyzers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::config::{FilterConfig, TokenizerConfig};

    #[test]
    fn test_registry_lookup() {
        let mut custom = BTreeMap::new();
        custom.insert(
            "folded".to_string(),
            AnalyzerConfig::new(TokenizerConfig::Whitespace).with_filter(FilterConfig::AsciiFolding),
        );
        let registry = AnalyzerRegistry::from_configs(&custom).unwrap();

        assert!(registry.contains("standard"));
        assert!(registry.contains("folded"));
        let analyzer = registry.get("folded").unwrap();
        assert_eq!(analyzer.tokens("déjà vu").unwrap()[0].text, "deja");

        let err = registry.get("missing").unwrap_err();
        assert_eq!(err.to_string(), "Analysis error: unknown analyzer 'missing'");
    }
}

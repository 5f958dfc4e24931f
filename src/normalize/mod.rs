//! Text Normalization
//!
//! Cleans raw OCR output of Vietnamese identity cards. The correction table is
//! data: literal find/replace pairs run first, in order, then regex
//! substitutions, in order. The result is trimmed.
//!
//! The built-in table lives in [`defaults`]; a JSON file of the same shape
//! can replace it at startup:
//!
//! ```json
//! {
//!   "replacements": [{ "find": "Ho va ten", "replace": "Họ và tên" }],
//!   "patterns": [{ "pattern": "[ \\t]+", "replace": " " }]
//! }
//! ```

mod defaults;

use std::path::Path;

use regex::Regex;
use serde::Deserialize;

/// Rule table loading errors
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("Failed to read rule table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse rule table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Serialized form of a rule table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub patterns: Vec<PatternRule>,
}

/// Literal substitution
#[derive(Debug, Clone, Deserialize)]
pub struct Replacement {
    pub find: String,
    pub replace: String,
}

/// Regex substitution; `replace` may use `$1`-style captures
#[derive(Debug, Clone, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub replace: String,
}

/// Compiled rule table
#[derive(Debug, Clone)]
pub struct NormalizationRules {
    replacements: Vec<Replacement>,
    patterns: Vec<(Regex, String)>,
}

impl NormalizationRules {
    /// Compile a rule table, failing on the first invalid pattern
    pub fn compile(table: RuleTable) -> Result<Self, RulesError> {
        let patterns = table
            .patterns
            .into_iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.replace))
                    .map_err(|source| RulesError::InvalidPattern {
                        pattern: rule.pattern,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            replacements: table
                .replacements
                .into_iter()
                .filter(|r| !r.find.is_empty())
                .collect(),
            patterns,
        })
    }

    /// Rules for Vietnamese citizen identity cards
    pub fn builtin() -> Self {
        // The built-in patterns are constants covered by tests
        Self::compile(defaults::table()).unwrap_or_else(|e| {
            tracing::error!("Built-in normalization rules failed to compile: {}", e);
            Self::empty()
        })
    }

    /// No-op table
    pub fn empty() -> Self {
        Self {
            replacements: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Load a JSON rule table from disk
    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let raw = std::fs::read_to_string(path)?;
        let table: RuleTable = serde_json::from_str(&raw)?;
        Self::compile(table)
    }

    pub fn len(&self) -> usize {
        self.replacements.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every rule to `raw` and trim the result
    pub fn apply(&self, raw: &str) -> String {
        let mut text = raw.to_string();

        for rule in &self.replacements {
            if text.contains(&rule.find) {
                text = text.replace(&rule.find, &rule.replace);
            }
        }

        for (re, replacement) in &self.patterns {
            text = re.replace_all(&text, replacement.as_str()).into_owned();
        }

        text.trim().to_string()
    }
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self::builtin()
    }
}

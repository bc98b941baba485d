//! Fixture configuration
//!
//! Plain serde data with builder-style setters. Loadable from TOML:
//!
//! ```toml
//! repeat_count = 5
//! omit_auto_properties = false
//! numbers = "sequence"
//! random_seed = 42
//!
//! [recursion]
//! policy = "omit"
//! depth = 2
//! ```

use serde::{Deserialize, Serialize};
use specimen_core::{
    NullRecursionBehavior, OmitOnRecursionBehavior, SpecimenBuilderTransformation, SpecimenError,
    SpecimenResult, ThrowingRecursionBehavior,
};
use std::sync::Arc;

/// How a fixture reacts to recursive requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum RecursionPolicy {
    /// Fail with the request path
    #[default]
    Throw,
    /// Resolve the repeat to null
    Null,
    /// Omit the repeat once it is in flight `depth` times
    Omit {
        /// Occurrences that make a request recursive
        #[serde(default = "default_depth")]
        depth: usize,
    },
}

fn default_depth() -> usize {
    1
}

impl RecursionPolicy {
    /// Behavior installing this policy
    ///
    /// # Errors
    /// `InvalidArgument` for an omit depth of zero
    pub fn behavior(self) -> SpecimenResult<Arc<dyn SpecimenBuilderTransformation>> {
        Ok(match self {
            Self::Throw => Arc::new(ThrowingRecursionBehavior),
            Self::Null => Arc::new(NullRecursionBehavior),
            Self::Omit { depth } => Arc::new(OmitOnRecursionBehavior::with_depth(depth)?),
        })
    }
}

/// Source of anonymous numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberStrategy {
    /// Random numbers unique within their band
    #[default]
    Random,
    /// `1, 2, 3, ...` per numeric type
    Sequence,
}

/// Fixture configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Items produced for "many" requests
    pub repeat_count: usize,
    /// Skip property population after construction
    pub omit_auto_properties: bool,
    /// Reaction to recursive requests
    pub recursion: RecursionPolicy,
    /// Source of anonymous numbers
    pub numbers: NumberStrategy,
    /// Seed for random numbers; entropy when absent
    pub random_seed: Option<u64>,
}

impl FixtureConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With repeat count
    #[inline]
    #[must_use]
    pub fn with_repeat_count(mut self, count: usize) -> Self {
        self.repeat_count = count;
        self
    }

    /// With auto-properties switched off or on
    #[inline]
    #[must_use]
    pub fn with_omit_auto_properties(mut self, omit: bool) -> Self {
        self.omit_auto_properties = omit;
        self
    }

    /// With recursion policy
    #[inline]
    #[must_use]
    pub fn with_recursion(mut self, policy: RecursionPolicy) -> Self {
        self.recursion = policy;
        self
    }

    /// With number strategy
    #[inline]
    #[must_use]
    pub fn with_numbers(mut self, numbers: NumberStrategy) -> Self {
        self.numbers = numbers;
        self
    }

    /// With a fixed random seed
    #[inline]
    #[must_use]
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    /// `InvalidArgument` for malformed TOML or values failing [`validate`](Self::validate)
    pub fn from_toml_str(content: &str) -> SpecimenResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            SpecimenError::invalid_argument(format!("invalid fixture configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// `InvalidArgument` for a zero repeat count or a zero recursion depth
    pub fn validate(&self) -> SpecimenResult<()> {
        if self.repeat_count == 0 {
            return Err(SpecimenError::invalid_argument(
                "repeat count must be at least 1",
            ));
        }
        if let RecursionPolicy::Omit { depth: 0 } = self.recursion {
            return Err(SpecimenError::invalid_argument(
                "recursion depth must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            repeat_count: 3,
            omit_auto_properties: false,
            recursion: RecursionPolicy::Throw,
            numbers: NumberStrategy::Random,
            random_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = FixtureConfig::new();
        assert_eq!(config.repeat_count, 3);
        assert!(!config.omit_auto_properties);
        assert_eq!(config.recursion, RecursionPolicy::Throw);
        assert_eq!(config.numbers, NumberStrategy::Random);
        assert_eq!(config.random_seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_toml() {
        let content = r#"
repeat_count = 5
omit_auto_properties = true
numbers = "sequence"
random_seed = 42

[recursion]
policy = "omit"
depth = 2
"#;
        let config = FixtureConfig::from_toml_str(content).unwrap();
        assert_eq!(
            config,
            FixtureConfig::new()
                .with_repeat_count(5)
                .with_omit_auto_properties(true)
                .with_numbers(NumberStrategy::Sequence)
                .with_random_seed(42)
                .with_recursion(RecursionPolicy::Omit { depth: 2 })
        );
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config = FixtureConfig::from_toml_str("repeat_count = 7").unwrap();
        assert_eq!(config, FixtureConfig::new().with_repeat_count(7));

        let omit = FixtureConfig::from_toml_str("[recursion]\npolicy = \"omit\"").unwrap();
        assert_eq!(omit.recursion, RecursionPolicy::Omit { depth: 1 });
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(FixtureConfig::from_toml_str("repeat_count = 0").is_err());
        assert!(FixtureConfig::from_toml_str("[recursion]\npolicy = \"omit\"\ndepth = 0").is_err());
        assert!(FixtureConfig::from_toml_str("numbers = \"fibonacci\"").is_err());
        assert!(FixtureConfig::from_toml_str("repeat_count = ").is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = FixtureConfig::new().with_recursion(RecursionPolicy::Null);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""policy":"null""#));
        let back: FixtureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn policies_map_to_behaviors() {
        use specimen_core::{behavior_is, is_recursion_behavior};

        let throw = RecursionPolicy::Throw.behavior().unwrap();
        assert!(behavior_is::<ThrowingRecursionBehavior>(throw.as_ref()));
        let omit = RecursionPolicy::Omit { depth: 3 }.behavior().unwrap();
        assert!(is_recursion_behavior(omit.as_ref()));
        assert!(RecursionPolicy::Omit { depth: 0 }.behavior().is_err());
    }
}

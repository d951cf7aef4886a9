use nms_core::NmsConfig;
use crate::error::NmsResult;
use crate::config::SelectorConfig;
use crate::configured_selector::ConfiguredSelector;
use crate::types::SuppressionPolicy;

/// Builder for creating a `ConfiguredSelector`
#[derive(Debug, Clone)]
pub struct SelectorBuilder {
    config: NmsConfig,
    policy: SuppressionPolicy,
    // Preprocessing
    normalize_responses: bool,
    truncate_responses: bool,
}

impl Default for SelectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::from_config(SelectorConfig::new())
    }

    /// Only cells strictly above this value become candidates
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the keypoint diameter used for overlap tests
    pub fn neighborhood_size(mut self, size: f32) -> Self {
        self.config.neighborhood_size = size;
        self
    }

    /// Set the largest tolerated overlap (0.0-1.0)
    pub fn overlap_threshold(mut self, max_overlap: f32) -> Self {
        self.config.overlap_threshold = max_overlap;
        self
    }

    /// Set the number of threads for batch selection
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads;
        self
    }

    pub fn policy(mut self, policy: SuppressionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable min/max normalization onto [0, 255]
    pub fn normalize_responses(mut self, enable: bool) -> Self {
        self.normalize_responses = enable;
        self
    }

    /// Enable or disable truncation toward zero
    pub fn truncate_responses(mut self, enable: bool) -> Self {
        self.truncate_responses = enable;
        self
    }

    /// Apply the Harris reference preset
    pub fn preset_harris_reference(self) -> Self {
        self.apply_preset(SelectorConfig::harris_reference_preset())
    }

    /// Apply the strict preset
    pub fn preset_strict(self) -> Self {
        self.apply_preset(SelectorConfig::strict_preset())
    }

    /// Apply the permissive preset
    pub fn preset_permissive(self) -> Self {
        self.apply_preset(SelectorConfig::permissive_preset())
    }

    // Thread count is a deployment setting and survives presets
    fn apply_preset(self, preset: SelectorConfig) -> Self {
        let n_threads = self.config.n_threads;
        let mut next = Self::from_config(preset);
        next.config.n_threads = n_threads;
        next
    }

    /// Build the `ConfiguredSelector`
    pub fn build(self) -> NmsResult<ConfiguredSelector> {
        ConfiguredSelector::new(self.to_config())
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.clone().to_config().summary()
    }

    /// Create a builder from an existing `SelectorConfig`
    pub fn from_config(config: SelectorConfig) -> Self {
        Self {
            config: config.core,
            policy: config.policy,
            normalize_responses: config.normalize_responses,
            truncate_responses: config.truncate_responses,
        }
    }

    /// Convert the builder into a `SelectorConfig`
    pub fn to_config(self) -> SelectorConfig {
        SelectorConfig {
            core: self.config,
            policy: self.policy,
            normalize_responses: self.normalize_responses,
            truncate_responses: self.truncate_responses,
            name: None,
            description: None,
            version: None,
        }
    }
}

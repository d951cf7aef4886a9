use nms_core::NmsConfig;
use crate::builder::SelectorBuilder;
use crate::error::{NmsError, NmsResult};
use crate::types::SuppressionPolicy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete selector configuration with all settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectorConfig {
    /// Threshold, neighborhood size, overlap limit, threads
    pub core: NmsConfig,
    pub policy: SuppressionPolicy,
    /// Stretch responses onto [0, 255] before thresholding
    pub normalize_responses: bool,
    /// Truncate responses toward zero after normalization
    pub truncate_responses: bool,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub version: Option<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorConfig {
    /// Reference thresholds on the raw map, no preprocessing
    pub fn new() -> Self {
        Self {
            core: NmsConfig::default(),
            policy: SuppressionPolicy::FirstOverlapReplacement,
            normalize_responses: false,
            truncate_responses: false,
            name: None,
            description: None,
            version: None,
        }
    }

    /// Raw Harris response in, keypoints out: normalize to [0, 255], truncate,
    /// keep cells above 100 with a 6 px neighborhood and no tolerated overlap
    pub fn harris_reference_preset() -> Self {
        Self {
            normalize_responses: true,
            truncate_responses: true,
            name: Some("Harris Reference".to_string()),
            description: Some("Normalized Harris map, first-overlap replacement".to_string()),
            version: Some("1.0".to_string()),
            ..Self::new()
        }
    }

    /// Same thresholds with a suppression result free of overlapping pairs
    pub fn strict_preset() -> Self {
        Self {
            policy: SuppressionPolicy::BestOverlap,
            normalize_responses: true,
            truncate_responses: false,
            name: Some("Strict".to_string()),
            description: Some("Candidate must beat every keypoint it overlaps".to_string()),
            version: Some("1.0".to_string()),
            ..Self::new()
        }
    }

    /// Denser output for low-texture frames
    pub fn permissive_preset() -> Self {
        Self {
            core: NmsConfig {
                threshold: 80.0,
                overlap_threshold: 0.3,
                ..NmsConfig::default()
            },
            policy: SuppressionPolicy::BestOverlap,
            normalize_responses: true,
            truncate_responses: false,
            name: Some("Permissive".to_string()),
            description: Some("Lower threshold, tolerates partial overlap".to_string()),
            version: Some("1.0".to_string()),
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    /// Convert to SelectorBuilder for further customization
    pub fn to_builder(self) -> SelectorBuilder {
        SelectorBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "SelectorConfig: threshold={}, size={}, max_overlap={}, policy={}, threads={}, preprocessing=[normalize:{}, truncate:{}]",
            self.core.threshold,
            self.core.neighborhood_size,
            self.core.overlap_threshold,
            self.policy,
            self.core.n_threads,
            self.normalize_responses,
            self.truncate_responses
        )
    }

    /// Validate configuration parameters.
    ///
    /// The threshold must be finite here; the free selection functions
    /// accept any value.
    pub fn validate(&self) -> NmsResult<()> {
        let threshold = self.core.threshold;
        if !threshold.is_finite() {
            return Err(NmsError::InvalidThreshold(threshold));
        }
        let size = self.core.neighborhood_size;
        if !size.is_finite() || size <= 0.0 {
            return Err(NmsError::InvalidNeighborhoodSize(size));
        }
        let max_overlap = self.core.overlap_threshold;
        if !(0.0..=1.0).contains(&max_overlap) {
            return Err(NmsError::InvalidOverlapThreshold(max_overlap));
        }
        if self.core.n_threads == 0 {
            return Err(NmsError::InvalidThreadCount(self.core.n_threads));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> NmsResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> NmsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> NmsResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> NmsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from a `.toml` file, anything else is read as JSON
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> NmsResult<Self> {
        let is_toml = path
            .as_ref()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::load_toml(path)
        } else {
            Self::load_json(path)
        }
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> NmsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> NmsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> NmsResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> NmsResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configured_selector::ConfiguredSelector;

    #[test]
    fn test_presets_are_valid() {
        for cfg in [
            SelectorConfig::new(),
            SelectorConfig::harris_reference_preset(),
            SelectorConfig::strict_preset(),
            SelectorConfig::permissive_preset(),
        ] {
            assert!(cfg.validate().is_ok(), "{}", cfg.summary());
        }
    }

    #[test]
    fn test_harris_reference_values() {
        let cfg = SelectorConfig::harris_reference_preset();
        assert_eq!(cfg.core.threshold, 100.0);
        assert_eq!(cfg.core.neighborhood_size, 6.0);
        assert_eq!(cfg.core.overlap_threshold, 0.0);
        assert_eq!(cfg.policy, SuppressionPolicy::FirstOverlapReplacement);
        assert!(cfg.normalize_responses && cfg.truncate_responses);
    }

    #[test]
    fn test_invalid_neighborhood_size() {
        for size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let mut cfg = SelectorConfig::new();
            cfg.core.neighborhood_size = size;
            assert!(matches!(cfg.validate(), Err(NmsError::InvalidNeighborhoodSize(_))));
        }
    }

    #[test]
    fn test_invalid_overlap_threshold() {
        for max_overlap in [-0.1, 1.5, f32::NAN] {
            let mut cfg = SelectorConfig::new();
            cfg.core.overlap_threshold = max_overlap;
            assert!(matches!(cfg.validate(), Err(NmsError::InvalidOverlapThreshold(_))));
        }
    }

    #[test]
    fn test_invalid_thread_count() {
        let mut cfg = SelectorConfig::new();
        cfg.core.n_threads = 0;
        assert!(matches!(cfg.validate(), Err(NmsError::InvalidThreadCount(0))));
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        for threshold in [f32::NEG_INFINITY, f32::INFINITY, f32::NAN] {
            let mut cfg = SelectorConfig::new();
            cfg.core.threshold = threshold;
            assert!(matches!(cfg.validate(), Err(NmsError::InvalidThreshold(_))));
        }
    }

    #[test]
    fn test_extreme_finite_threshold_is_valid() {
        let mut cfg = SelectorConfig::new();
        cfg.core.threshold = f32::MIN;
        assert!(cfg.validate().is_ok());
        cfg.core.threshold = -12.5;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_with_metadata() {
        let cfg = SelectorConfig::new().with_metadata("Frame 12", "tuned for dusk");
        assert_eq!(cfg.name.as_deref(), Some("Frame 12"));
        assert_eq!(cfg.version.as_deref(), Some("1.0"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let original = SelectorConfig::permissive_preset();
        let parsed = SelectorConfig::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_round_trip() {
        let original = SelectorConfig::strict_preset();
        let text = original.to_toml().unwrap();
        assert!(text.contains("best_overlap"));
        let parsed = SelectorConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_extreme_threshold_json_round_trip() {
        for threshold in [f32::MIN, f32::MAX, -0.5] {
            let mut original = SelectorConfig::new();
            original.core.threshold = threshold;
            let parsed = SelectorConfig::from_json(&original.to_json().unwrap()).unwrap();
            assert_eq!(parsed.core.threshold, threshold);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_infinite_threshold_never_serialized() {
        let mut cfg = SelectorConfig::new();
        cfg.core.threshold = f32::NEG_INFINITY;
        assert!(ConfiguredSelector::new(cfg.clone()).is_err());
        // serde_json writes the value as null, which must not load
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(SelectorConfig::from_json(&json).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_loaded_config_is_validated() {
        let mut cfg = SelectorConfig::new();
        cfg.core.overlap_threshold = 2.0;
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(matches!(
            SelectorConfig::from_json(&json),
            Err(NmsError::InvalidOverlapThreshold(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("nms-select-config-{}.toml", std::process::id()));
        let original = SelectorConfig::harris_reference_preset();
        original.save_toml(&path).unwrap();
        let loaded = SelectorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, original);
    }
}

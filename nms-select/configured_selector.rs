use std::borrow::Cow;

use nms_core::{KeypointSet, ResponseMap};
use rayon::prelude::*;

use crate::config::SelectorConfig;
use crate::error::NmsResult;
use crate::normalize::{normalize_to_u8_range, truncate_responses};
use crate::suppression;
use crate::types::SelectionStats;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A validated selector configuration, ready to run on response maps.
///
/// Each call applies the configured preprocessing (normalization, then
/// truncation) and runs one suppression pass with the configured policy.
#[derive(Debug, Clone)]
pub struct ConfiguredSelector {
    pub(crate) config: SelectorConfig,
}

impl ConfiguredSelector {
    pub fn new(config: SelectorConfig) -> NmsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The map as it will be thresholded.
    ///
    /// Borrows the input when no preprocessing is enabled.
    pub fn prepare<'a>(&self, map: &'a ResponseMap) -> Cow<'a, ResponseMap> {
        let mut prepared = Cow::Borrowed(map);
        if self.config.normalize_responses {
            prepared = Cow::Owned(normalize_to_u8_range(&prepared));
        }
        if self.config.truncate_responses {
            prepared = Cow::Owned(truncate_responses(&prepared));
        }
        prepared
    }

    /// Select keypoints from a single response map.
    pub fn select(&self, map: &ResponseMap) -> KeypointSet {
        self.select_with_stats(map).0
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, map), fields(rows = map.rows(), cols = map.cols()))
    )]
    pub fn select_with_stats(&self, map: &ResponseMap) -> (KeypointSet, SelectionStats) {
        let prepared = self.prepare(map);
        let core = &self.config.core;
        let (keypoints, stats) = suppression::select_with_stats(
            &prepared,
            core.threshold,
            core.neighborhood_size,
            core.overlap_threshold,
            self.config.policy,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(
            candidates = stats.candidates,
            kept = keypoints.len(),
            replaced = stats.replaced,
            discarded = stats.discarded,
            "suppression finished"
        );

        (keypoints, stats)
    }

    /// Select keypoints from independent frames in parallel.
    ///
    /// Output order matches input order. Runs on the current rayon pool; see
    /// `nms_core::init_thread_pool`.
    pub fn select_batch(&self, maps: &[ResponseMap]) -> Vec<KeypointSet> {
        self.select_batch_with_stats(maps)
            .into_iter()
            .map(|(keypoints, _)| keypoints)
            .collect()
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, maps), fields(frames = maps.len()))
    )]
    pub fn select_batch_with_stats(
        &self,
        maps: &[ResponseMap],
    ) -> Vec<(KeypointSet, SelectionStats)> {
        maps.par_iter().map(|map| self.select_with_stats(map)).collect()
    }

    /// Get the full configuration
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Get a summary of the selector's configuration.
    pub fn config_summary(&self) -> String {
        self.config.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SelectorBuilder;
    use crate::types::SuppressionPolicy;

    /// Raw Harris-like map: tiny values with two close peaks and one far away
    fn raw_response_map() -> ResponseMap {
        let mut map = ResponseMap::from_fn(16, 16, |r, c| ((r + c) % 3) as f32 * 1.0e-6);
        map.set(4, 4, 3.0e-4);
        map.set(4, 5, 4.0e-4);
        map.set(12, 12, 2.5e-4);
        map
    }

    #[test]
    fn test_prepare_borrows_without_preprocessing() {
        let selector = SelectorBuilder::new().build().unwrap();
        let map = raw_response_map();
        assert!(matches!(selector.prepare(&map), Cow::Borrowed(_)));
    }

    #[test]
    fn test_raw_map_needs_normalization() {
        let map = raw_response_map();

        let plain = SelectorBuilder::new().build().unwrap();
        assert!(plain.select(&map).is_empty());

        let reference = SelectorBuilder::new().preset_harris_reference().build().unwrap();
        let kps = reference.select(&map);
        let positions: Vec<_> = kps.iter().map(|k| (k.x, k.y)).collect();
        assert_eq!(positions, vec![(5.0, 4.0), (12.0, 12.0)]);
        assert_eq!(kps[0].response, 255.0);
    }

    #[test]
    fn test_truncation_after_normalization() {
        let selector = SelectorBuilder::new().preset_harris_reference().build().unwrap();
        let raw = raw_response_map();
        let prepared = selector.prepare(&raw);
        assert!(prepared.data().iter().all(|v| v.fract() == 0.0));
        assert_eq!(prepared.at(4, 5), 255.0);
    }

    #[test]
    fn test_stats_match_output() {
        let selector = SelectorBuilder::new().preset_harris_reference().build().unwrap();
        let (kps, stats) = selector.select_with_stats(&raw_response_map());
        assert_eq!(stats.kept(), kps.len());
        assert_eq!(stats.candidates, 3);
        assert_eq!(stats.replaced, 1);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let selector = SelectorBuilder::new().preset_strict().build().unwrap();
        assert_eq!(selector.config().policy, SuppressionPolicy::BestOverlap);

        let frames: Vec<ResponseMap> = (0..6)
            .map(|shift| {
                ResponseMap::from_fn(24, 24, |r, c| (((r + shift) * 17 + c * 31) % 101) as f32)
            })
            .collect();

        let batch = selector.select_batch(&frames);
        assert_eq!(batch.len(), frames.len());
        for (frame, kps) in frames.iter().zip(&batch) {
            assert_eq!(&selector.select(frame), kps);
        }
    }

    #[test]
    fn test_empty_batch() {
        let selector = SelectorBuilder::new().build().unwrap();
        assert!(selector.select_batch(&[]).is_empty());
    }
}

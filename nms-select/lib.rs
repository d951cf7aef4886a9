//! Non-maximum suppression of dense corner-response maps.
//!
//! A response map (one score per pixel, typically a Harris response stretched
//! onto [0, 255]) is reduced to a sparse set of keypoints: every cell above the
//! threshold becomes a candidate, and candidates whose neighborhoods overlap
//! an accepted keypoint are resolved by a [`SuppressionPolicy`].
//!
//! - [`suppression`]: the pure selection functions.
//! - [`overlap`]: the disc intersection-over-union measure.
//! - [`normalize`]: min/max normalization and truncation of response maps.
//! - [`SelectorConfig`], [`SelectorBuilder`], [`ConfiguredSelector`]:
//!   validated configuration, presets and batch selection across frames.
//!
//! # Features
//!
//! - `serde`: JSON and TOML (de)serialization of configurations and core types.
//! - `tracing`: spans and debug events around configured selection.

pub mod builder;
pub mod config;
pub mod configured_selector;
pub mod error;
pub mod normalize;
pub mod overlap;
pub mod suppression;
pub mod types;

pub use builder::SelectorBuilder;
pub use config::SelectorConfig;
pub use configured_selector::ConfiguredSelector;
pub use error::{NmsError, NmsResult};
pub use overlap::{overlap, overlaps};
pub use suppression::{
    overlapping_pairs, row_major_candidates, select, select_with_policy, select_with_stats,
    suppress_candidates,
};
pub use types::{SelectionStats, SuppressionPolicy};

pub use nms_core::{Keypoint, KeypointSet, NmsConfig, ResponseMap};

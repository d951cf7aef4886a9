use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{GrayImage, ImageReader};
use nms_select::{overlapping_pairs, ConfiguredSelector, NmsError, SelectionStats};
use serde::Serialize;

pub use nms_core::{
    self, init_thread_pool, Keypoint, KeypointSet, NmsConfig, ResponseMap, ShapeError,
};
pub use nms_select::{self, SelectorBuilder, SelectorConfig, SuppressionPolicy};

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("NMS error: {0}")]
    Nms(#[from] NmsError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("More than one input would be written to {}", .0.display())]
    DuplicateOutput(PathBuf),
}

pub type SelectorResult<T> = Result<T, SelectorError>;

/// Named starting points for a selector configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    HarrisReference,
    Strict,
    Permissive,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::HarrisReference, Preset::Strict, Preset::Permissive];

    pub fn config(self) -> SelectorConfig {
        match self {
            Preset::HarrisReference => SelectorConfig::harris_reference_preset(),
            Preset::Strict => SelectorConfig::strict_preset(),
            Preset::Permissive => SelectorConfig::permissive_preset(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::HarrisReference => "harris-reference",
            Preset::Strict => "strict",
            Preset::Permissive => "permissive",
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "harris" | "harris-reference" | "reference" => Ok(Preset::HarrisReference),
            "strict" => Ok(Preset::Strict),
            "permissive" => Ok(Preset::Permissive),
            other => Err(format!(
                "unknown preset '{other}' (expected harris-reference, strict or permissive)"
            )),
        }
    }
}

/// Per-frame result as written to disk
#[derive(Debug, Clone, Serialize)]
pub struct SelectionDump {
    pub source: String,
    pub rows: usize,
    pub cols: usize,
    pub policy: SuppressionPolicy,
    pub threshold: f32,
    pub neighborhood_size: f32,
    pub overlap_threshold: f32,
    pub stats: SelectionStats,
    /// Pairs of kept keypoints that still overlap beyond the threshold
    pub overlapping_pairs: usize,
    pub keypoints: KeypointSet,
}

/// High-level keypoint selector over whole frames
pub struct FrameSelector {
    selector: ConfiguredSelector,
}

impl FrameSelector {
    /// Validate the configuration and create a selector
    pub fn new(config: SelectorConfig) -> SelectorResult<Self> {
        Ok(Self {
            selector: ConfiguredSelector::new(config)?,
        })
    }

    pub fn select(&self, map: &ResponseMap) -> KeypointSet {
        self.selector.select(map)
    }

    /// Select keypoints from several frames on the current rayon pool
    pub fn select_frames(&self, maps: &[ResponseMap]) -> Vec<KeypointSet> {
        self.selector.select_batch(maps)
    }

    /// Load a response map from disk and select keypoints from it
    pub fn select_file<P: AsRef<Path>>(&self, path: P) -> SelectorResult<SelectionDump> {
        let path = path.as_ref();
        let map = load_response_map(path)?;
        Ok(self.run(&path.display().to_string(), &map))
    }

    /// Select keypoints and collect everything needed for a report
    pub fn run(&self, source: &str, map: &ResponseMap) -> SelectionDump {
        let (keypoints, stats) = self.selector.select_with_stats(map);
        self.dump(source, map, keypoints, stats)
    }

    /// Same as [`FrameSelector::run`] for many frames, in parallel
    pub fn run_batch(&self, frames: &[(String, ResponseMap)]) -> Vec<SelectionDump> {
        let maps: Vec<ResponseMap> = frames.iter().map(|(_, map)| map.clone()).collect();
        self.selector
            .select_batch_with_stats(&maps)
            .into_iter()
            .zip(frames)
            .map(|((keypoints, stats), (source, map))| self.dump(source, map, keypoints, stats))
            .collect()
    }

    pub fn config(&self) -> &SelectorConfig {
        self.selector.config()
    }

    fn dump(
        &self,
        source: &str,
        map: &ResponseMap,
        keypoints: KeypointSet,
        stats: SelectionStats,
    ) -> SelectionDump {
        let cfg = self.config();
        SelectionDump {
            source: source.to_string(),
            rows: map.rows(),
            cols: map.cols(),
            policy: cfg.policy,
            threshold: cfg.core.threshold,
            neighborhood_size: cfg.core.neighborhood_size,
            overlap_threshold: cfg.core.overlap_threshold,
            stats,
            overlapping_pairs: overlapping_pairs(&keypoints, cfg.core.overlap_threshold).len(),
            keypoints,
        }
    }
}

/// Read a response map from disk.
///
/// `.json` files hold a serialized [`ResponseMap`]. Anything else is decoded as
/// an image and converted to 8-bit luma, one cell per pixel.
pub fn load_response_map<P: AsRef<Path>>(path: P) -> SelectorResult<ResponseMap> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    } else {
        let img = ImageReader::open(path)?.decode()?.to_luma8();
        response_map_from_luma(&img)
    }
}

/// Rows follow image height, columns follow width
pub fn response_map_from_luma(img: &GrayImage) -> SelectorResult<ResponseMap> {
    let (width, height) = img.dimensions();
    let data = img.as_raw().iter().map(|&v| f32::from(v)).collect();
    Ok(ResponseMap::new(height as usize, width as usize, data)?)
}

/// `<stem>.keypoints.json` inside `out_dir`, or next to the input
pub fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    keypoints_file(input, out_dir, None)
}

/// One output path per batch input.
///
/// Inputs whose default paths collide (same stem, shared output directory)
/// get their position in the batch appended to the stem. Fails if two
/// outputs still coincide after that.
pub fn batch_output_paths(
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
) -> SelectorResult<Vec<PathBuf>> {
    let defaults: Vec<PathBuf> = inputs.iter().map(|p| output_path(p, out_dir)).collect();

    let mut uses: HashMap<&Path, usize> = HashMap::new();
    for path in &defaults {
        *uses.entry(path.as_path()).or_default() += 1;
    }

    let paths: Vec<PathBuf> = inputs
        .iter()
        .zip(&defaults)
        .enumerate()
        .map(|(index, (input, default))| {
            if uses[default.as_path()] > 1 {
                keypoints_file(input, out_dir, Some(index))
            } else {
                default.clone()
            }
        })
        .collect();

    let mut seen = HashSet::new();
    for path in &paths {
        if !seen.insert(path) {
            return Err(SelectorError::DuplicateOutput(path.clone()));
        }
    }
    Ok(paths)
}

fn keypoints_file(input: &Path, out_dir: Option<&Path>, index: Option<usize>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let name = match index {
        Some(i) => format!("{stem}-{i}.keypoints.json"),
        None => format!("{stem}.keypoints.json"),
    };
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

pub fn write_dump<P: AsRef<Path>>(path: P, dump: &SelectionDump) -> SelectorResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}

//! Core types shared by the keypoint suppression crates.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense per-pixel response map in row-major layout
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawResponseMap"))]
pub struct ResponseMap {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

/// Returned when the value buffer does not match the requested dimensions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("response map {rows}x{cols} needs {expected} values, got {actual}")]
pub struct ShapeError {
    pub rows: usize,
    pub cols: usize,
    pub expected: usize,
    pub actual: usize,
}

impl ResponseMap {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, ShapeError> {
        let expected = rows.checked_mul(cols).unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(ShapeError {
                rows,
                cols,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build a map by evaluating `f(row, col)` for every cell
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Response at an integer cell. Panics when out of bounds.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) outside {}x{}",
            self.rows,
            self.cols
        );
        self.data[row * self.cols + col]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Overwrite a single cell. Panics when out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) outside {}x{}",
            self.rows,
            self.cols
        );
        self.data[row * self.cols + col] = value;
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Cells as `(row, col, value)`, row index outer and column index inner.
    pub fn iter_row_major(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let cols = self.cols.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i / cols, i % cols, v))
    }

    /// Apply `f` to every value, keeping the shape
    pub fn map_values<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawResponseMap {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawResponseMap> for ResponseMap {
    type Error = ShapeError;

    fn try_from(raw: RawResponseMap) -> Result<Self, Self::Error> {
        ResponseMap::new(raw.rows, raw.cols, raw.data)
    }
}

/// Point of interest selected from a response map.
///
/// `x` is the column and `y` the row of the originating cell; `size` is the
/// diameter of the neighborhood used for overlap tests.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32, response: f32) -> Self {
        Self { x, y, size, response }
    }

    /// Keypoint centred on grid cell `(row, col)`
    pub fn from_cell(row: usize, col: usize, size: f32, response: f32) -> Self {
        Self {
            x: col as f32,
            y: row as f32,
            size,
            response,
        }
    }
}

/// Output of one suppression pass
pub type KeypointSet = Vec<Keypoint>;

/// Minimum value (exclusive) for a cell of an 8-bit normalized Harris map
pub const DEFAULT_THRESHOLD: f32 = 100.0;
/// Sobel aperture of the reference Harris response
pub const HARRIS_APERTURE_SIZE: u32 = 3;
/// Keypoint diameter, twice the Sobel aperture
pub const DEFAULT_NEIGHBORHOOD_SIZE: f32 = (2 * HARRIS_APERTURE_SIZE) as f32;
/// Any overlap at all suppresses
pub const DEFAULT_OVERLAP_THRESHOLD: f32 = 0.0;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NmsConfig {
    pub threshold: f32,
    pub neighborhood_size: f32,
    pub overlap_threshold: f32,
    pub n_threads: usize,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            neighborhood_size: DEFAULT_NEIGHBORHOOD_SIZE,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch() {
        let err = ResponseMap::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert_eq!(err.expected, 6);
        assert_eq!(err.actual, 5);
    }

    #[test]
    fn test_empty_map() {
        let map = ResponseMap::new(0, 0, Vec::new()).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.iter_row_major().count(), 0);
    }

    #[test]
    fn test_row_major_iteration() {
        let map = ResponseMap::from_fn(2, 3, |r, c| (r * 10 + c) as f32);
        let cells: Vec<_> = map.iter_row_major().collect();
        assert_eq!(cells[0], (0, 0, 0.0));
        assert_eq!(cells[2], (0, 2, 2.0));
        assert_eq!(cells[3], (1, 0, 10.0));
        assert_eq!(cells[5], (1, 2, 12.0));
    }

    #[test]
    fn test_accessors() {
        let mut map = ResponseMap::zeros(3, 4);
        map.set(2, 1, 7.5);
        assert_eq!(map.at(2, 1), 7.5);
        assert_eq!(map.get(2, 1), Some(7.5));
        assert_eq!(map.get(3, 0), None);
        assert_eq!(map.dimensions(), (3, 4));
    }

    #[test]
    fn test_keypoint_from_cell() {
        let kp = Keypoint::from_cell(2, 3, 6.0, 200.0);
        assert_eq!(kp.x, 3.0);
        assert_eq!(kp.y, 2.0);
    }

    #[test]
    fn test_default_config() {
        let cfg = NmsConfig::default();
        assert_eq!(cfg.threshold, 100.0);
        assert_eq!(cfg.neighborhood_size, 6.0);
        assert_eq!(cfg.overlap_threshold, 0.0);
        assert!(cfg.n_threads >= 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_bad_shape() {
        let bad = r#"{"rows": 2, "cols": 2, "data": [1.0, 2.0, 3.0]}"#;
        assert!(serde_json::from_str::<ResponseMap>(bad).is_err());

        let good = r#"{"rows": 1, "cols": 2, "data": [1.0, 2.0]}"#;
        let map: ResponseMap = serde_json::from_str(good).unwrap();
        assert_eq!(map.at(0, 1), 2.0);
    }
}

//! Non-maximum suppression over a dense response map.
//!
//! Cells are visited in row-major order and every cell whose response is
//! strictly above the threshold becomes a candidate keypoint. Each candidate
//! is tested against the keypoints accepted so far with a linear scan; what
//! happens on overlap is decided by the [`SuppressionPolicy`]. The scan order
//! decides which of two equally strong overlapping cells survives, so it is
//! part of the contract.

use nms_core::{Keypoint, KeypointSet, ResponseMap};

use crate::overlap::overlap;
use crate::types::{Outcome, SelectionStats, SuppressionPolicy};

/// Select keypoints with the reference first-overlap policy.
pub fn select(
    map: &ResponseMap,
    threshold: f32,
    neighborhood_size: f32,
    overlap_threshold: f32,
) -> KeypointSet {
    select_with_policy(
        map,
        threshold,
        neighborhood_size,
        overlap_threshold,
        SuppressionPolicy::FirstOverlapReplacement,
    )
}

pub fn select_with_policy(
    map: &ResponseMap,
    threshold: f32,
    neighborhood_size: f32,
    overlap_threshold: f32,
    policy: SuppressionPolicy,
) -> KeypointSet {
    select_with_stats(map, threshold, neighborhood_size, overlap_threshold, policy).0
}

pub fn select_with_stats(
    map: &ResponseMap,
    threshold: f32,
    neighborhood_size: f32,
    overlap_threshold: f32,
    policy: SuppressionPolicy,
) -> (KeypointSet, SelectionStats) {
    suppress_candidates(
        row_major_candidates(map, threshold, neighborhood_size),
        overlap_threshold,
        policy,
    )
}

/// Candidate keypoints of `map` in row-major order.
///
/// NaN cells never pass the strict comparison and are skipped.
pub fn row_major_candidates(
    map: &ResponseMap,
    threshold: f32,
    neighborhood_size: f32,
) -> impl Iterator<Item = Keypoint> + '_ {
    map.iter_row_major()
        .filter(move |&(_, _, response)| response > threshold)
        .map(move |(row, col, response)| {
            Keypoint::from_cell(row, col, neighborhood_size, response)
        })
}

/// Run the suppression scan over candidates in the order given.
pub fn suppress_candidates<I>(
    candidates: I,
    overlap_threshold: f32,
    policy: SuppressionPolicy,
) -> (KeypointSet, SelectionStats)
where
    I: IntoIterator<Item = Keypoint>,
{
    let mut kept = KeypointSet::new();
    let mut stats = SelectionStats::default();

    for candidate in candidates {
        let outcome = match policy {
            SuppressionPolicy::FirstOverlapReplacement => {
                insert_first_overlap(&mut kept, candidate, overlap_threshold)
            }
            SuppressionPolicy::BestOverlap => {
                insert_best_overlap(&mut kept, candidate, overlap_threshold)
            }
        };
        stats.record(outcome);
    }

    (kept, stats)
}

fn insert_first_overlap(kept: &mut KeypointSet, candidate: Keypoint, max_overlap: f32) -> Outcome {
    let mut overlapped = false;

    for existing in kept.iter_mut() {
        if overlap(&candidate, existing) > max_overlap {
            overlapped = true;
            if candidate.response > existing.response {
                *existing = candidate;
                return Outcome::Replaced { removed: 0 };
            }
        }
    }

    if overlapped {
        Outcome::Discarded
    } else {
        kept.push(candidate);
        Outcome::Appended
    }
}

fn insert_best_overlap(kept: &mut KeypointSet, candidate: Keypoint, max_overlap: f32) -> Outcome {
    let hits: Vec<usize> = kept
        .iter()
        .enumerate()
        .filter(|(_, existing)| overlap(&candidate, existing) > max_overlap)
        .map(|(i, _)| i)
        .collect();

    let Some((&first, rest)) = hits.split_first() else {
        kept.push(candidate);
        return Outcome::Appended;
    };

    if !hits.iter().all(|&i| candidate.response > kept[i].response) {
        return Outcome::Discarded;
    }

    kept[first] = candidate;
    // Highest index first so earlier indices stay valid
    for &i in rest.iter().rev() {
        kept.remove(i);
    }
    Outcome::Replaced { removed: rest.len() }
}

/// Index pairs `(i, j)`, `i < j`, whose overlap exceeds `overlap_threshold`.
///
/// Empty for any output of [`SuppressionPolicy::BestOverlap`].
pub fn overlapping_pairs(keypoints: &[Keypoint], overlap_threshold: f32) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in keypoints.iter().enumerate() {
        for (j, b) in keypoints.iter().enumerate().skip(i + 1) {
            if overlap(a, b) > overlap_threshold {
                pairs.push((i, j));
            }
        }
    }
    pairs
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn response_map() -> impl Strategy<Value = ResponseMap> {
        (1usize..12, 1usize..12).prop_flat_map(|(rows, cols)| {
            prop::collection::vec(prop_oneof![Just(0.0f32), 0.0f32..255.0], rows * cols)
                .prop_map(move |data| ResponseMap::new(rows, cols, data).unwrap())
        })
    }

    fn size() -> impl Strategy<Value = f32> {
        prop_oneof![Just(2.0f32), Just(3.0f32), Just(6.0f32), Just(8.0f32)]
    }

    fn max_overlap() -> impl Strategy<Value = f32> {
        prop_oneof![Just(0.0f32), Just(0.1f32), Just(0.3f32)]
    }

    proptest! {
        #[test]
        fn raising_threshold_never_adds_keypoints(
            map in response_map(),
            low in 0.0f32..200.0,
            delta in 0.0f32..80.0,
            size in size(),
            max_overlap in max_overlap(),
        ) {
            let policy = SuppressionPolicy::BestOverlap;
            let loose = select_with_policy(&map, low, size, max_overlap, policy);
            let tight = select_with_policy(&map, low + delta, size, max_overlap, policy);
            prop_assert!(tight.len() <= loose.len());
        }

        #[test]
        fn rerunning_on_output_suppresses_nothing(
            map in response_map(),
            threshold in 0.0f32..200.0,
            size in size(),
            max_overlap in max_overlap(),
        ) {
            let policy = SuppressionPolicy::BestOverlap;
            let first = select_with_policy(&map, threshold, size, max_overlap, policy);
            prop_assert!(overlapping_pairs(&first, max_overlap).is_empty());

            let (second, stats) = suppress_candidates(first.iter().copied(), max_overlap, policy);
            prop_assert_eq!(stats.replaced, 0);
            prop_assert_eq!(stats.discarded, 0);
            prop_assert_eq!(second, first);
        }

        #[test]
        fn output_is_subset_of_candidates(
            map in response_map(),
            threshold in 0.0f32..200.0,
            size in size(),
        ) {
            let candidates: Vec<Keypoint> = row_major_candidates(&map, threshold, size).collect();
            for policy in SuppressionPolicy::ALL {
                let (kps, stats) = select_with_stats(&map, threshold, size, 0.0, policy);
                prop_assert_eq!(stats.candidates, candidates.len());
                prop_assert_eq!(stats.kept(), kps.len());
                for kp in &kps {
                    prop_assert!(candidates.contains(kp));
                }
            }
        }
    }
}

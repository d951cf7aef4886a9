use nms_cli::{ResponseMap, SelectorBuilder, SuppressionPolicy};
use std::time::{Duration, Instant};

/// A short sequence of frames with drifting response blobs
fn synthetic_frames(count: usize, rows: usize, cols: usize) -> Vec<ResponseMap> {
    (0..count)
        .map(|shift| {
            ResponseMap::from_fn(rows, cols, |r, c| {
                let dr = ((r + shift) % 20) as f32 - 10.0;
                let dc = ((c + 2 * shift) % 20) as f32 - 10.0;
                (2.0e-4 * (-(dr * dr + dc * dc) / 6.0).exp()) - 1.0e-5
            })
        })
        .collect()
}

fn run_selection_demo(
    builder: SelectorBuilder,
    frames: &[ResponseMap],
) -> Result<(), nms_cli::nms_select::NmsError> {
    println!("   Config: {}", builder.summary());

    let selector = builder.build()?;

    let start = Instant::now();
    let results = selector.select_batch_with_stats(frames);
    let elapsed = start.elapsed();

    let kept: usize = results.iter().map(|(kps, _)| kps.len()).sum();
    let candidates: usize = results.iter().map(|(_, stats)| stats.candidates).sum();
    println!("   ⏱️  Time: {:.2?} for {} frames", elapsed, frames.len());
    println!("   🎯 Kept {} of {} candidates", kept, candidates);

    let max_overlap = selector.config().core.overlap_threshold;
    let leaks: usize = results
        .iter()
        .map(|(kps, _)| nms_cli::nms_select::overlapping_pairs(kps, max_overlap).len())
        .sum();
    println!("   📊 Overlapping pairs left: {}", leaks);
    println!();
    Ok(())
}

fn policy_comparison(frames: &[ResponseMap]) -> Result<(), Box<dyn std::error::Error>> {
    println!("   {:<28} {:<12} {:<10}", "Policy", "Time", "Keypoints");
    println!("   {}", "-".repeat(50));

    for policy in SuppressionPolicy::ALL {
        let selector = SelectorBuilder::new()
            .preset_harris_reference()
            .policy(policy)
            .build()?;

        let mut total_time = Duration::ZERO;
        let mut kept = 0;
        const RUNS: usize = 3;
        for _ in 0..RUNS {
            let start = Instant::now();
            kept = selector.select_batch(frames).iter().map(Vec::len).sum();
            total_time += start.elapsed();
        }

        println!("   {:<28} {:<12.2?} {:<10}", policy.as_str(), total_time / RUNS as u32, kept);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎯 NMS SelectorBuilder API Demo");
    println!("=================================\n");

    let frames = synthetic_frames(8, 240, 320);
    println!("📷 Processing {} synthetic frames of 320x240", frames.len());

    println!("\n🚀 Demo 1: Harris Reference Preset");
    run_selection_demo(SelectorBuilder::new().preset_harris_reference(), &frames)?;

    println!("✨ Demo 2: Strict Preset");
    run_selection_demo(SelectorBuilder::new().preset_strict(), &frames)?;

    println!("🌟 Demo 3: Permissive Preset");
    run_selection_demo(SelectorBuilder::new().preset_permissive(), &frames)?;

    println!("⚙️  Demo 4: Custom Configuration");
    run_selection_demo(
        SelectorBuilder::new()
            .normalize_responses(true)
            .threshold(120.0)
            .neighborhood_size(10.0)
            .overlap_threshold(0.1)
            .policy(SuppressionPolicy::BestOverlap),
        &frames,
    )?;

    println!("⏱️  Demo 5: Policy Comparison");
    policy_comparison(&frames)?;

    println!("\n🎉 All demos completed successfully!");
    Ok(())
}

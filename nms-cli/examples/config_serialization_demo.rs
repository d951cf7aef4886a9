use nms_cli::{FrameSelector, Preset, ResponseMap, SelectorConfig};
use std::time::Instant;

/// Raw Harris-like response: small values with a grid of Gaussian bumps
fn synthetic_response(rows: usize, cols: usize) -> ResponseMap {
    ResponseMap::from_fn(rows, cols, |r, c| {
        let dr = (r % 32) as f32 - 16.0;
        let dc = (c % 32) as f32 - 16.0;
        let peak = 1.0e-4 * (1.0 + ((r / 32 + c / 32) % 4) as f32);
        peak * (-(dr * dr + dc * dc) / 18.0).exp()
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔧 NMS Configuration Serialization Demo");
    println!("========================================\n");

    let map = synthetic_response(256, 256);
    println!("📷 Synthetic response map: {}x{}", map.cols(), map.rows());

    let out_dir = std::env::temp_dir().join("nms-config-demo");
    std::fs::create_dir_all(&out_dir)?;

    // Demo 1: Create configurations
    println!("\n📋 Demo 1: Creating Configurations");

    let reference = SelectorConfig::harris_reference_preset()
        .with_metadata("Reference", "Matches the classic Harris NMS pipeline");
    let strict = SelectorConfig::strict_preset()
        .with_metadata("Tracking", "No overlapping keypoints across frames");
    let custom = SelectorConfig::permissive_preset()
        .to_builder()
        .threshold(60.0)
        .neighborhood_size(8.0)
        .to_config()
        .with_metadata("Low Light", "Dense output for dim footage");

    for cfg in [&reference, &strict, &custom] {
        println!("   • {}", cfg.summary());
    }

    // Demo 2: JSON and TOML
    println!("\n📄 Demo 2: JSON and TOML");

    let json = reference.to_json()?;
    println!("   Reference config JSON:\n{}", json);
    println!("\n   Tracking config TOML:\n{}", strict.to_toml()?);

    let json_path = out_dir.join("reference.json");
    let toml_path = out_dir.join("low_light.toml");
    reference.save_json(&json_path)?;
    custom.save_toml(&toml_path)?;
    println!("   ✅ Saved {} and {}", json_path.display(), toml_path.display());

    // Demo 3: Load and select
    println!("\n🎯 Demo 3: Loading and Selection");

    for path in [&json_path, &toml_path] {
        let config = SelectorConfig::load(path)?;
        let selector = FrameSelector::new(config)?;
        let start = Instant::now();
        let dump = selector.run(&path.display().to_string(), &map);
        println!(
            "   • {}: {:.2?}, {} keypoints ({} candidates, {} overlapping pairs)",
            selector.config().name.as_deref().unwrap_or("unnamed"),
            start.elapsed(),
            dump.keypoints.len(),
            dump.stats.candidates,
            dump.overlapping_pairs
        );
    }

    // Demo 4: Preset comparison
    println!("\n📊 Demo 4: Preset Comparison");
    println!(
        "   {:<18} {:<8} {:<6} {:<8} {:<28} {:<10}",
        "Preset", "Thresh", "Size", "Overlap", "Policy", "Normalize"
    );
    println!("   {}", "-".repeat(82));
    for preset in Preset::ALL {
        let cfg = preset.config();
        println!(
            "   {:<18} {:<8} {:<6} {:<8} {:<28} {:<10}",
            preset.as_str(),
            cfg.core.threshold,
            cfg.core.neighborhood_size,
            cfg.core.overlap_threshold,
            cfg.policy.as_str(),
            if cfg.normalize_responses { "Yes" } else { "No" }
        );
    }

    // Demo 5: Round trip
    println!("\n🔄 Demo 5: Round-trip Testing");
    let from_json = SelectorConfig::from_json(&custom.to_json()?)?;
    let from_toml = SelectorConfig::from_toml(&custom.to_toml()?)?;
    assert_eq!(custom, from_json);
    assert_eq!(custom, from_toml);
    println!("   ✅ JSON and TOML round trips are consistent");

    println!("\n🎉 Configuration serialization demo completed!");
    println!("📁 Files written to {}", out_dir.display());
    Ok(())
}

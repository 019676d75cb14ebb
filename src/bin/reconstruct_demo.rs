use grain_recon::config::reconstruct::{self, ReconstructConfig};
use grain_recon::data::{names, Volume};
use grain_recon::diagnostics::ReconstructionReport;
use grain_recon::io::{save_label_slice, write_json_file};
use grain_recon::pipeline::run_reconstruction;
use grain_recon::CancelToken;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = reconstruct::load_config(Path::new(&config_path))?;

    let sample = config.volume.build().map_err(|e| e.to_string())?;
    let mut volume = sample.volume;
    let report = run_reconstruction(&mut volume, &config.pipeline_options(), &CancelToken::new())
        .map_err(|e| format!("{e} (code {})", e.code()))?;

    print_text_summary(&report, &config);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report).map_err(|e| e.to_string())?;
        println!("\nJSON report written to {}", path.display());
    } else {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
        println!("\nJSON report:\n{json}");
    }

    if let Some(dir) = &config.output.slice_dir {
        save_slices(dir, &volume)?;
        println!("Slice images written to {}", dir.display());
    }
    Ok(())
}

fn print_text_summary(report: &ReconstructionReport, config: &ReconstructConfig) {
    let v = &report.volume;
    println!("Reconstruction summary");
    println!(
        "  volume: {}x{}x{} ({} good voxels)",
        v.dims[0], v.dims[1], v.dims[2], v.good_voxels
    );
    if let Some(alignment) = &report.alignment {
        println!("  alignment ({}):", alignment.method);
        let base = config.volume.slice_offsets.first().copied().unwrap_or([0, 0]);
        for (z, shift) in alignment.shifts.iter().enumerate() {
            let truth = config.volume.slice_offsets.get(z).copied().unwrap_or([0, 0]);
            println!(
                "    slice {z}: shift ({}, {}), baked ({}, {})",
                shift[0],
                shift[1],
                truth[0] - base[0],
                truth[1] - base[1]
            );
        }
    }
    if let Some(seg) = &report.segmentation {
        println!("  features: {} (tolerance {:.2})", seg.features, seg.tolerance);
    }
    if let Some(group) = &report.grouping {
        println!("  groups: {} from {} features ({})", group.groups, group.features, group.strategy);
    }
    println!("  total_ms: {:.3}", report.timing.total_ms);
    for stage in &report.timing.stages {
        println!("    {}: {:.3} ms", stage.label, stage.elapsed_ms);
    }
}

fn save_slices(dir: &Path, volume: &Volume) -> Result<(), String> {
    for name in [names::FEATURE_IDS, names::PARENT_IDS] {
        let Ok(ids) = volume.cell.typed::<i32>(name, 1) else {
            continue;
        };
        for z in 0..volume.geometry.nz() {
            let path = dir.join(format!("{name}_z{z:03}.png"));
            save_label_slice(&path, &volume.geometry, ids.as_slice(), z).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn usage() -> String {
    "Usage: reconstruct_demo <config.json>".to_string()
}

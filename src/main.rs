use grain_recon::pipeline::{run_reconstruction, PipelineOptions};
use grain_recon::synthetic::SyntheticVolume;
use grain_recon::CancelToken;

fn main() {
    // Demo stub: segments a small synthetic volume with default settings
    let sample = match SyntheticVolume::new([24, 24, 6]).with_grains(8).build() {
        Ok(sample) => sample,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };
    let mut volume = sample.volume;
    match run_reconstruction(&mut volume, &PipelineOptions::default(), &CancelToken::new()) {
        Ok(report) => {
            let features = report.segmentation.map_or(0, |s| s.features);
            println!("features={} latency_ms={:.3}", features, report.timing.total_ms);
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

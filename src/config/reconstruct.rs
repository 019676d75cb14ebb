use crate::pipeline::PipelineOptions;
use crate::synthetic::SyntheticVolume;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the JSON run report goes; printed to stdout when unset.
    pub json_out: Option<PathBuf>,
    /// Directory for per-slice PNGs of the feature and parent ids.
    pub slice_dir: Option<PathBuf>,
    /// Write the pipeline's shift log here when alignment runs.
    pub shift_log: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Recipe of the synthetic input volume.
    pub volume: SyntheticVolume,
    pub pipeline: PipelineOptions,
    pub output: OutputConfig,
}

impl ReconstructConfig {
    /// Pipeline options with the output shift log folded into alignment.
    pub fn pipeline_options(&self) -> PipelineOptions {
        let mut options = self.pipeline.clone();
        if let (Some(align), Some(path)) = (options.align.as_mut(), &self.output.shift_log) {
            align.write_shift_log = true;
            align.shift_log_path = Some(path.clone());
        }
        options
    }
}

pub fn load_config(path: &Path) -> Result<ReconstructConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignmentMethod;
    use crate::pipeline::GroupingMethod;

    #[test]
    fn partial_config_fills_defaults() {
        let json = r#"{
            "volume": { "dims": [20, 20, 4], "grains": 6, "slice_offsets": [[0, 0], [1, 2]] },
            "pipeline": {
                "align": { "method": { "kind": "mutual_information" }, "sample_stride": 2 },
                "segment": { "tolerance": 3.0, "use_mask": true },
                "group": { "method": { "kind": "micro_texture", "tolerance_deg": 4.0 } }
            },
            "output": { "shift_log": "out/shifts.txt" }
        }"#;
        let config: ReconstructConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.volume.dims, [20, 20, 4]);
        assert_eq!(config.volume.seed, SyntheticVolume::default().seed);

        let options = config.pipeline_options();
        let align = options.align.unwrap();
        assert_eq!(align.method, AlignmentMethod::MutualInformation);
        assert_eq!(align.sample_stride, 2);
        assert!(align.write_shift_log);
        assert_eq!(options.segment.tolerance, 3.0);
        match options.group.unwrap().method {
            GroupingMethod::MicroTexture(texture) => {
                assert_eq!(texture.tolerance_deg, 4.0);
                assert!(texture.use_running_average);
            }
            other => panic!("unexpected grouping {other:?}"),
        }
    }

    #[test]
    fn twin_grouping_is_tagged_by_kind() {
        let json = r#"{ "pipeline": { "group": { "method": { "kind": "twins", "axis_tolerance_deg": 2.5 } } } }"#;
        let config: ReconstructConfig = serde_json::from_str(json).unwrap();
        match config.pipeline.group.map(|g| g.method) {
            Some(GroupingMethod::Twins(twins)) => {
                assert_eq!(twins.axis_tolerance_deg, 2.5);
                assert_eq!(twins.angle_tolerance_deg, 1.0);
            }
            other => panic!("unexpected grouping {other:?}"),
        }
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = load_config(Path::new("/nonexistent/reconstruct.json")).unwrap_err();
        assert!(err.contains("/nonexistent/reconstruct.json"));
    }
}

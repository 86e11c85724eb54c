use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::heart_rate::{AvgHeartRateConfig, MaxHeartRateConfig};
use crate::thresholds::ThresholdConfig;

/// Everything needed to analyse one activity's heart rate.
/// Threshold analysis only runs when `thresholds` is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisProfile {
    #[serde(alias = "avg")]
    pub average: AvgHeartRateConfig,
    #[serde(alias = "max")]
    pub peak: MaxHeartRateConfig,
    pub thresholds: Option<ThresholdConfig>,
}

impl AnalysisProfile {
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let mut de = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut de).map_err(|e| ProfileError::Parse {
            path: e.path().to_string(),
            message: e.into_inner().to_string(),
        })
    }
}

/// Reads a profile from disk (JSON).
/// A missing file yields the default profile.
pub fn load_profile(path: impl AsRef<Path>) -> Result<AnalysisProfile, ProfileError> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("profile not found at {}, using defaults", path.display());
        return Ok(AnalysisProfile::default());
    }

    let contents = std::fs::read_to_string(path)?;
    let profile = AnalysisProfile::from_json(&contents)?;
    log::info!(
        "profile loaded from {} (thresholds={})",
        path.display(),
        profile.thresholds.is_some()
    );
    Ok(profile)
}

/// Writes a profile to disk as pretty-printed JSON.
pub fn save_profile(profile: &AnalysisProfile, path: impl AsRef<Path>) -> Result<(), ProfileError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(profile)?;
    std::fs::write(path, json)?;
    log::info!("profile saved to {}", path.display());
    Ok(())
}

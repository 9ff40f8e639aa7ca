use serde::{Deserialize, Serialize};

/// Limits for one VM run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Maximum live call frames, the root frame included.
    pub max_frames: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig { max_frames: 1000 }
    }
}

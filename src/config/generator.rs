//! Naming and import context for generated code.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_RUNTIME_PATH: &str = "ent_sdk";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub output_dir: PathBuf,
    /// Path of this crate as seen from generated code.
    pub runtime_path: String,
    /// Module holding the descriptors, e.g. `crate::schemas`.
    pub descriptors_path: String,
    /// Full path of the viewer-context type.
    pub vc_import: String,
    pub vc_name: String,
    /// Type of the session argument taken by generated operations.
    pub session_type: String,
    /// Name of the storage-base trait emitted in `ent_model.rs`.
    pub base_model_name: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("src/ent"),
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
            descriptors_path: "crate::schemas".to_string(),
            vc_import: "crate::vc::ViewerContext".to_string(),
            vc_name: "ViewerContext".to_string(),
            session_type: format!("dyn {}::Session", DEFAULT_RUNTIME_PATH),
            base_model_name: "EntModel".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Defaults overridden by `ENTGEN_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let vars: [(&str, &mut String); 6] = [
            ("ENTGEN_RUNTIME_PATH", &mut config.runtime_path),
            ("ENTGEN_DESCRIPTORS_PATH", &mut config.descriptors_path),
            ("ENTGEN_VC_IMPORT", &mut config.vc_import),
            ("ENTGEN_VC_NAME", &mut config.vc_name),
            ("ENTGEN_SESSION_TYPE", &mut config.session_type),
            ("ENTGEN_BASE_MODEL_NAME", &mut config.base_model_name),
        ];
        for (key, slot) in vars {
            if let Some(value) = env_value(key) {
                *slot = value;
            }
        }
        if let Some(dir) = env_value("ENTGEN_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

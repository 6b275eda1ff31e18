use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::workdir::WorkDirMode;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub native_lib_dir: PathBuf, // holds libqemu-system-<arch>.so
    pub cache_dir: PathBuf,      // qemu-assets-<version>/ is extracted here
    pub assets_zip: Option<PathBuf>,
    pub workdir_mode: WorkDirMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            native_lib_dir: PathBuf::from("."),
            cache_dir: std::env::temp_dir(),
            assets_zip: None,
            workdir_mode: WorkDirMode::Resolve,
        }
    }
}

pub fn load(path: &str) -> anyhow::Result<Config> {
    Ok(serde_yaml::from_str(&std::fs::read_to_string(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("native_lib_dir: /data/app/lib/arm64\nworkdir_mode: chdir\n").unwrap();
        assert_eq!(cfg.native_lib_dir, PathBuf::from("/data/app/lib/arm64"));
        assert_eq!(cfg.workdir_mode, WorkDirMode::Chdir);
        assert!(cfg.assets_zip.is_none());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(serde_yaml::from_str::<Config>("workdir_mode: global\n").is_err());
    }
}

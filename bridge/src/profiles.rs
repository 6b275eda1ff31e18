use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Saved launch settings for one VM.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub arch: String,        // e.g. "x86_64" -> libqemu-system-x86_64.so
    pub working_dir: String, // VM folder holding disks and props.yaml
    pub cmdline: String,
    /// Extra `${name}` values for the command line
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            arch: "x86_64".into(),
            working_dir: ".".into(),
            cmdline: "-nodefaults".into(),
            vars: BTreeMap::new(),
        }
    }
}

pub fn save_profile(path: &str, p: &Profile) -> anyhow::Result<()> {
    let data = serde_yaml::to_string(p)?;
    fs::write(path, data)?;
    Ok(())
}

pub fn load_profile(path: &str) -> anyhow::Result<Profile> {
    if !Path::new(path).exists() {
        anyhow::bail!("profile not found: {}", path);
    }
    let raw = fs::read_to_string(path)?;
    let p: Profile = serde_yaml::from_str(&raw)?;
    Ok(p)
}

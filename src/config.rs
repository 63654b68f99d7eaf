use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV: &str = "FSCOORDS_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub transform: TransformConfig,
}

/// Where subject files live. Templates may contain `{subject}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_root: PathBuf,
    /// Scanner-space contact coordinates, relative to `data_root`.
    pub coords_file: String,
    /// Localization record, relative to `data_root`.
    pub localization_file: String,
    /// Surface reconstruction subjects directory, relative to `data_root`.
    pub subjects_dir: String,
    /// Reference volume inside a reconstructed subject.
    pub reference_volume: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("/"),
            coords_file: "data10/RAM/subjects/{subject}/imaging/{subject}/electrodenames_coordinates_native_and_T1.csv".to_string(),
            localization_file: "data10/RAM/subjects/{subject}/imaging/{subject}/localization.json".to_string(),
            subjects_dir: "data/eeg/freesurfer/subjects".to_string(),
            reference_volume: "{subject}/mri/orig.mgz".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// `mri_info` executable used to read the volume matrices.
    pub mri_info: PathBuf,
    /// Whether the coordinate CSV starts with a header row.
    pub has_headers: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            mri_info: PathBuf::from("mri_info"),
            has_headers: false,
        }
    }
}

/// Resolved input files for one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct FileLocations {
    pub coords_t1: PathBuf,
    pub fs_orig_t1: PathBuf,
    pub localization: PathBuf,
}

fn expand(template: &str, subject: &str) -> String {
    template.replace("{subject}", subject)
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.as_ref().display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("invalid config {}", path.as_ref().display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Config named by `FSCOORDS_CONFIG`, defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn file_locations(&self, subject: &str) -> FileLocations {
        let paths = &self.paths;
        FileLocations {
            coords_t1: paths.data_root.join(expand(&paths.coords_file, subject)),
            fs_orig_t1: paths
                .data_root
                .join(expand(&paths.subjects_dir, subject))
                .join(expand(&paths.reference_volume, subject)),
            localization: paths
                .data_root
                .join(expand(&paths.localization_file, subject)),
        }
    }
}

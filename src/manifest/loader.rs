//! Manifest file loading and saving.
//!
//! The document format is picked from the file extension: `.yaml`/`.yml` or `.json`.

use std::path::Path;
use tracing::{debug, info};

use super::{Manifest, ManifestError};

const MAX_MANIFEST_FILE_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(ManifestError::UnsupportedFormat { extension }),
        }
    }
}

impl Manifest {
    /// Parse a YAML manifest document
    pub fn from_yaml_str(content: &str) -> Result<Self, ManifestError> {
        serde_yaml::from_str(content).map_err(|e| ManifestError::Parse {
            source_name: "<yaml>".to_string(),
            error: e.to_string(),
        })
    }

    /// Parse a JSON manifest document
    pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(content).map_err(|e| ManifestError::Parse {
            source_name: "<json>".to_string(),
            error: e.to_string(),
        })
    }

    pub fn to_yaml_string(&self) -> Result<String, ManifestError> {
        serde_yaml::to_string(self).map_err(|e| ManifestError::Parse {
            source_name: "<yaml>".to_string(),
            error: e.to_string(),
        })
    }

    /// Load and validate a manifest file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let format = ManifestFormat::from_path(path)?;

        let metadata = std::fs::metadata(path).map_err(|e| ManifestError::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        if metadata.len() > MAX_MANIFEST_FILE_SIZE {
            return Err(ManifestError::FileRead {
                path: path.display().to_string(),
                error: format!(
                    "file too large ({} bytes > {MAX_MANIFEST_FILE_SIZE} byte limit)",
                    metadata.len()
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let manifest = match format {
            ManifestFormat::Yaml => Self::from_yaml_str(&content),
            ManifestFormat::Json => Self::from_json_str(&content),
        }
        .map_err(|e| match e {
            ManifestError::Parse { error, .. } => ManifestError::Parse {
                source_name: path.display().to_string(),
                error,
            },
            other => other,
        })?;

        manifest.validate()?;

        info!(
            path = %path.display(),
            objects = manifest.objects.len(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    /// Write the manifest to disk in the format implied by the extension
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let path = path.as_ref();
        let content = match ManifestFormat::from_path(path)? {
            ManifestFormat::Yaml => self.to_yaml_string()?,
            ManifestFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| ManifestError::Parse {
                    source_name: path.display().to_string(),
                    error: e.to_string(),
                })?
            }
        };

        std::fs::write(path, content).map_err(|e| ManifestError::FileWrite {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        debug!(path = %path.display(), "Manifest saved");
        Ok(())
    }
}

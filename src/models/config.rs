//! Runtime configuration of the image pipeline and the reconcile job.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

/// Default per-file size cap: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
/// Default number of files accepted in one upload batch.
pub const DEFAULT_MAX_FILES_PER_BATCH: usize = 10;
/// Default set of accepted upload extensions.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Errors raised while loading [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Options consumed by the image pipeline.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ImagePipelineConfig {
    /// Directory under which `vehicles/{vehicle_id}` directories are created.
    pub upload_root: PathBuf,
    /// Accepted extensions, compared case-insensitively and without the dot.
    #[validate(length(min = 1, message = "at least one extension must be allowed"))]
    pub allowed_extensions: Vec<String>,
    #[validate(range(min = 1))]
    pub max_file_size_bytes: u64,
    #[validate(range(min = 1))]
    pub max_files_per_batch: usize,
    /// Number each batch from 0 and let its first image take over the
    /// primary flag. Uploads are not serialised per vehicle.
    pub legacy_compat: bool,
}

impl Default for ImagePipelineConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("public/images"),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_files_per_batch: DEFAULT_MAX_FILES_PER_BATCH,
            legacy_compat: false,
        }
    }
}

impl ImagePipelineConfig {
    /// Default options rooted at `upload_root`.
    pub fn with_upload_root(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            ..Self::default()
        }
    }

    /// Allowed extensions lower-cased and stripped of any leading dot.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

/// Configuration of the reconcile binary.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub database_url: String,
    #[serde(default)]
    #[validate(nested)]
    pub images: ImagePipelineConfig,
}

impl ServerConfig {
    /// Load `default.yaml` and `{APP_ENV}.yaml` from `config_dir` (both
    /// optional), then apply `APP_*` environment overrides such as
    /// `APP_DATABASE_URL` or `APP_IMAGES__MAX_FILE_SIZE_BYTES`.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigLoadError> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());

        let settings = Config::builder()
            .add_source(File::from(config_dir.join("default")).required(false))
            .add_source(File::from(config_dir.join(app_env)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("images.allowed_extensions"),
            )
            .build()?;

        let server_config: ServerConfig = settings.try_deserialize()?;
        server_config.validate()?;
        Ok(server_config)
    }
}

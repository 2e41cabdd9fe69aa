use super::env::{get_env_optional, get_env_or_default, parse_env_or_default};
use super::{AppConfigTrait, ConfigError, ConfigSource};
use std::collections::HashMap;
use std::path::PathBuf;

/// Settings for the extraction pipeline itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory uploads are spooled to while they are processed
    pub temp_dir: PathBuf,
    /// Resolution pages are rasterized at before being shown to the model
    pub render_dpi: u32,
    /// Name of the field catalog used for the final mapping
    pub mapping_key: String,
    /// Optional JSON file replacing the builtin catalogs
    pub mapping_file: Option<PathBuf>,
    pub pdfium_library_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub const MIN_DPI: u32 = 72;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("/app/temp_data"),
            render_dpi: 300,
            mapping_key: "dock_management".to_string(),
            mapping_file: None,
            pdfium_library_path: None,
        }
    }
}

impl AppConfigTrait for PipelineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(PipelineConfig {
            temp_dir: PathBuf::from(get_env_or_default("TEMP_DIR", "/app/temp_data")),
            render_dpi: parse_env_or_default(
                "RENDER_DPI",
                defaults.render_dpi,
                "render_dpi",
                "integer >= 72",
            )?,
            mapping_key: get_env_or_default("MAPPING_KEY", &defaults.mapping_key),
            mapping_file: get_env_optional("MAPPING_FILE").map(PathBuf::from),
            pdfium_library_path: get_env_optional("PDFIUM_LIBRARY_PATH").map(PathBuf::from),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.render_dpi < Self::MIN_DPI {
            return Err(ConfigError::invalid_value(
                "render_dpi",
                self.render_dpi.to_string(),
                "integer >= 72",
            ));
        }

        if self.mapping_key.trim().is_empty() {
            return Err(ConfigError::validation_failed("Mapping key cannot be empty"));
        }

        if self.temp_dir.as_os_str().is_empty() {
            return Err(ConfigError::validation_failed(
                "Temporary directory cannot be empty",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "temp_dir".to_string(),
            ConfigSource::EnvVar("TEMP_DIR".to_string()),
        );
        sources.insert(
            "render_dpi".to_string(),
            ConfigSource::EnvVar("RENDER_DPI".to_string()),
        );
        sources.insert(
            "mapping_key".to_string(),
            ConfigSource::EnvVar("MAPPING_KEY".to_string()),
        );
        if let Some(path) = &self.mapping_file {
            sources.insert(
                "mapping_file".to_string(),
                ConfigSource::File(path.display().to_string()),
            );
        }
        sources
    }
}

//! Configuration values and the Figment loader
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. Discovered files (`~/.formkit/formkit.*`, then `./.formkit/formkit.*`)
//! 3. Files passed explicitly, e.g. `--config` on the command line
//! 4. `FORMKIT_` environment variables, nested keys separated by `__`
//!    (`FORMKIT_IMAGE__MAX_BYTES=524288`)

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use formkit_common::Pretty;
use formkit_image::ImageLimits;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::discovery::{ConfigFormat, FileDiscovery, CONFIG_DIR_NAME};
use crate::error::ConfigError;
use crate::ConfigResult;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FORMKIT_";

/// Separator for nested keys in environment variable names.
pub const ENV_SPLIT: &str = "__";

/// Name prefix given to user-added fields by default.
pub const DEFAULT_CUSTOM_PREFIX: &str = "custom_";

/// Everything the engine and CLI read from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Prefix of custom field names, stripped to form the submitted `fieldId`
    pub custom_prefix: String,
    /// Bounds applied to images attached to file fields
    pub image: ImageLimits,
    pub store: StoreConfig,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            custom_prefix: DEFAULT_CUSTOM_PREFIX.to_string(),
            image: ImageLimits::default(),
            store: StoreConfig::default(),
        }
    }
}

impl FormConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.custom_prefix.is_empty() {
            return Err(ConfigError::invalid_value(
                "custom_prefix",
                "must not be empty",
            ));
        }
        if self.image.max_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "image.max_bytes",
                "must be greater than zero",
            ));
        }
        if self.image.max_dimension == 0 {
            return Err(ConfigError::invalid_value(
                "image.max_dimension",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Strip the custom prefix from a field name, if present.
    pub fn field_id<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.custom_prefix.as_str()).unwrap_or(name)
    }
}

/// Where custom field definitions are persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let base = dirs::home_dir()
            .map(|home| home.join(CONFIG_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME));
        Self {
            directory: base.join("custom-fields"),
        }
    }
}

/// Builds a [`FormConfig`] from all sources
///
/// Nothing is cached; every [`ConfigLoader::load`] reads the sources again.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    discovery: FileDiscovery,
    explicit_files: Vec<PathBuf>,
    read_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            discovery: FileDiscovery::new(),
            explicit_files: Vec::new(),
            read_env: true,
        }
    }

    pub fn with_discovery(mut self, discovery: FileDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Merge `path` after discovered files. The file must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_files.push(path.into());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    pub fn figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(FormConfig::default()));

        for file in self.discovery.discover_all() {
            figment = figment.merge(file_provider(&file.path, file.format));
        }

        for path in &self.explicit_files {
            figment = figment.merge(explicit_file(path)?);
        }

        if self.read_env {
            trace!("Merging {}* environment variables", ENV_PREFIX);
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SPLIT));
        }

        Ok(figment)
    }

    /// Extract and validate the merged configuration.
    pub fn load(&self) -> ConfigResult<FormConfig> {
        let config: FormConfig = self.figment()?.extract()?;
        config.validate()?;
        debug!("Loaded configuration: {}", Pretty(&config));
        Ok(config)
    }
}

fn explicit_file(path: &Path) -> ConfigResult<Figment> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    Ok(file_provider(path, format))
}

fn file_provider(path: &Path, format: ConfigFormat) -> Figment {
    trace!("Loading config file: {} ({:?})", path.display(), format);
    match format {
        ConfigFormat::Toml => Figment::from(Toml::file(path)),
        ConfigFormat::Yaml => Figment::from(Yaml::file(path)),
        ConfigFormat::Json => Figment::from(Json::file(path)),
    }
}

/// Load configuration from the standard locations and environment.
pub fn load() -> ConfigResult<FormConfig> {
    ConfigLoader::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn isolated(global: &TempDir, project: &TempDir) -> ConfigLoader {
        ConfigLoader::new().with_discovery(FileDiscovery::with_directories(
            Some(global.path().to_path_buf()),
            Some(project.path().to_path_buf()),
        ))
    }

    #[test]
    fn defaults() {
        let config = FormConfig::default();
        assert_eq!(config.custom_prefix, "custom_");
        assert_eq!(config.image.max_bytes, 1024 * 1024);
        assert_eq!(config.image.max_dimension, 1920);
        assert!(config.store.directory.ends_with(".formkit/custom-fields"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn field_id_strips_prefix_only_once() {
        let config = FormConfig::default();
        assert_eq!(config.field_id("custom_42"), "42");
        assert_eq!(config.field_id("custom_custom_x"), "custom_x");
        assert_eq!(config.field_id("price"), "price");
    }

    #[test]
    #[serial]
    fn project_file_overrides_global_file() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            global.path().join("formkit.toml"),
            "custom_prefix = \"x_\"\n[image]\nmax_dimension = 800\n",
        )
        .unwrap();
        fs::write(
            project.path().join("formkit.yaml"),
            "image:\n  max_dimension: 640\n",
        )
        .unwrap();

        let config = isolated(&global, &project).without_env().load().unwrap();
        assert_eq!(config.custom_prefix, "x_");
        assert_eq!(config.image.max_dimension, 640);
        assert_eq!(config.image.max_bytes, 1024 * 1024);
    }

    #[test]
    #[serial]
    fn environment_overrides_files() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            project.path().join("formkit.json"),
            r#"{"image": {"max_bytes": 2048}}"#,
        )
        .unwrap();

        std::env::set_var("FORMKIT_IMAGE__MAX_BYTES", "4096");
        std::env::set_var("FORMKIT_STORE__DIRECTORY", "/var/lib/formkit");
        let result = isolated(&global, &project).load();
        std::env::remove_var("FORMKIT_IMAGE__MAX_BYTES");
        std::env::remove_var("FORMKIT_STORE__DIRECTORY");

        let config = result.unwrap();
        assert_eq!(config.image.max_bytes, 4096);
        assert_eq!(config.store.directory, PathBuf::from("/var/lib/formkit"));
    }

    #[test]
    #[serial]
    fn explicit_file_wins_over_discovered_files() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("formkit.toml"), "custom_prefix = \"p_\"\n").unwrap();
        let explicit = global.path().join("override.yml");
        fs::write(&explicit, "custom_prefix: e_\n").unwrap();

        let config = isolated(&global, &project)
            .with_file(&explicit)
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.custom_prefix, "e_");
    }

    #[test]
    fn explicit_file_must_exist_and_be_parseable() {
        let tmp = TempDir::new().unwrap();
        let err = ConfigLoader::new()
            .with_file(tmp.path().join("missing.toml"))
            .figment()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let ini = tmp.path().join("formkit.ini");
        fs::write(&ini, "").unwrap();
        let err = ConfigLoader::new().with_file(&ini).figment().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    #[serial]
    fn zero_limits_fail_validation() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("formkit.toml"), "[image]\nmax_bytes = 0\n").unwrap();

        let err = isolated(&global, &project).without_env().load().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "image.max_bytes")
        );
    }

    #[test]
    #[serial]
    fn malformed_file_is_a_parse_error() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("formkit.toml"), "image = [\n").unwrap();

        let err = isolated(&global, &project).without_env().load().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}

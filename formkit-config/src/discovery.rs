//! Configuration file discovery
//!
//! Looks for `formkit.{toml,yaml,yml,json}` in the global directory
//! (`~/.formkit/`) and then in the project directory (`./.formkit/`).
//! Files are returned lowest precedence first so they can be merged in order.

use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

/// Name of the configuration directory in both scopes.
pub const CONFIG_DIR_NAME: &str = ".formkit";

const FILE_NAMES: [&str; 4] = [
    "formkit.toml",
    "formkit.yaml",
    "formkit.yml",
    "formkit.json",
];

/// Format detected from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Where a file was discovered; project files override global ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigScope {
    Global,
    Project,
}

/// A discovered configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub format: ConfigFormat,
    pub scope: ConfigScope,
}

/// Finds configuration files in the global and project directories
#[derive(Debug, Clone, Default)]
pub struct FileDiscovery {
    global_dir: Option<PathBuf>,
    project_dir: Option<PathBuf>,
}

impl FileDiscovery {
    /// Discovery rooted at `~/.formkit` and `./.formkit`, resolved when searched
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovery over explicit directories, e.g. temp dirs in tests
    pub fn with_directories(global_dir: Option<PathBuf>, project_dir: Option<PathBuf>) -> Self {
        Self {
            global_dir,
            project_dir,
        }
    }

    pub fn discover_all(&self) -> Vec<ConfigFile> {
        let global_dir = self.global_dir.clone().or_else(resolve_global_dir);
        let project_dir = self.project_dir.clone().or_else(resolve_project_dir);

        let mut files = Vec::new();
        if let Some(dir) = global_dir {
            files.extend(search_directory(&dir, ConfigScope::Global));
        }
        if let Some(dir) = project_dir {
            files.extend(search_directory(&dir, ConfigScope::Project));
        }

        debug!("Discovered {} configuration files", files.len());
        files
    }
}

fn search_directory(dir: &Path, scope: ConfigScope) -> Vec<ConfigFile> {
    if !dir.exists() {
        trace!("Directory does not exist: {}", dir.display());
        return Vec::new();
    }
    if !dir.is_dir() {
        warn!("Path exists but is not a directory: {}", dir.display());
        return Vec::new();
    }

    FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let format = ConfigFormat::from_path(&path)?;
            trace!("Found config: {} ({:?})", path.display(), format);
            Some(ConfigFile {
                path,
                format,
                scope,
            })
        })
        .collect()
}

fn resolve_global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}

fn resolve_project_dir() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(CONFIG_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
    }

    #[test]
    fn global_files_come_before_project_files() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(global.path().join("formkit.toml"), "").unwrap();
        fs::write(project.path().join("formkit.yaml"), "").unwrap();
        fs::write(project.path().join("formkit.json"), "{}").unwrap();
        fs::write(project.path().join("other.toml"), "").unwrap();

        let discovery = FileDiscovery::with_directories(
            Some(global.path().to_path_buf()),
            Some(project.path().to_path_buf()),
        );
        let files = discovery.discover_all();
        let summary: Vec<_> = files.iter().map(|f| (f.scope, f.format)).collect();
        assert_eq!(
            summary,
            vec![
                (ConfigScope::Global, ConfigFormat::Toml),
                (ConfigScope::Project, ConfigFormat::Yaml),
                (ConfigScope::Project, ConfigFormat::Json),
            ]
        );
    }

    #[test]
    fn missing_directories_yield_nothing() {
        let tmp = TempDir::new().unwrap();
        let discovery = FileDiscovery::with_directories(
            Some(tmp.path().join("absent")),
            Some(tmp.path().join("also-absent")),
        );
        assert!(discovery.discover_all().is_empty());
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoamError};
use roam_assistant::popup::PopupSettings;
use roam_assistant::search::{builtin_descriptors, SearchAlgorithmSpec, DEFAULT_STRATEGY};
use roam_assistant::unlink::UnlinkSettings;

const APP_DIR: &str = "roam-assistant";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub graph: GraphConfig,
    #[serde(default)]
    pub unlink_finder: UnlinkSettings,
    #[serde(default)]
    pub smart_popup: PopupSettings,
    #[serde(default)]
    pub algorithms: Vec<SearchAlgorithmSpec>,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GraphConfig {
    pub name: String,
    #[serde(default)]
    pub api_token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KeybindingsConfig {
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default)]
    pub bindings: HashMap<String, String>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            bindings: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Relative paths are resolved against the config directory.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_preset() -> String {
    "vim".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("roam-assistant.log")
}

impl AppConfig {
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::defaults()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ROAM_").split("__").lowercase(true))
            .extract()
            .map_err(|e| RoamError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.graph.name.is_empty() {
            return Err(RoamError::Config("graph.name is required".into()));
        }
        if self.graph.api_token.is_empty() {
            return Err(RoamError::Config(
                "graph.api_token is required (set in config or ROAM_GRAPH__API_TOKEN env var)"
                    .into(),
            ));
        }
        if self.unlink_finder.minimum_characters == 0 {
            return Err(RoamError::Config(
                "unlink_finder.minimum_characters must be at least 1".into(),
            ));
        }
        if self.smart_popup.results_per_page == 0 {
            return Err(RoamError::Config(
                "smart_popup.results_per_page must be at least 1".into(),
            ));
        }
        self.smart_popup.hotkey_char()?;

        let descriptors = builtin_descriptors();
        for algorithm in &self.algorithms {
            let descriptor = descriptors
                .iter()
                .find(|d| d.name == algorithm.name)
                .ok_or_else(|| {
                    RoamError::Config(format!("Unknown search algorithm: {}", algorithm.name))
                })?;
            descriptor
                .check_fields(&algorithm.fields)
                .map_err(RoamError::Config)?;
        }
        Ok(())
    }

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(|xdg| PathBuf::from(xdg).join(APP_DIR))
            .or_else(|| {
                directories::BaseDirs::new()
                    .map(|dirs| dirs.home_dir().join(".config").join(APP_DIR))
            })
    }

    pub fn log_path(&self, config_dir: &Path) -> PathBuf {
        if self.logging.file.is_absolute() {
            self.logging.file.clone()
        } else {
            config_dir.join(&self.logging.file)
        }
    }

    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut defaults = Self::defaults();
        defaults.graph.name = "your-graph-name".into();
        let content = toml::to_string_pretty(&defaults)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn defaults() -> Self {
        Self {
            graph: GraphConfig {
                name: String::new(),
                api_token: String::new(),
            },
            unlink_finder: UnlinkSettings::default(),
            smart_popup: PopupSettings::default(),
            algorithms: vec![SearchAlgorithmSpec::new(DEFAULT_STRATEGY, vec![])],
            keybindings: KeybindingsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_assistant::popup::Frequency;
    use tempfile::TempDir;

    const GRAPH: &str = r#"
[graph]
name = "test-graph"
api_token = "token-123"
"#;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn load(extra: &str) -> Result<AppConfig> {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), &format!("{}{}", GRAPH, extra));
        AppConfig::load_from_path(&path)
    }

    #[test]
    fn loads_valid_config_from_toml() {
        let config = load(
            r#"
[unlink_finder]
minimum_characters = 4
alias_case_sensitive = true

[smart_popup]
results_per_page = 3
frequency = "hotkey"

[[algorithms]]
name = "Custom"
fields = ["echo '[]'"]

[keybindings]
preset = "emacs"
"#,
        )
        .unwrap();
        assert_eq!(config.graph.name, "test-graph");
        assert_eq!(config.unlink_finder.minimum_characters, 4);
        assert!(config.unlink_finder.alias_case_sensitive);
        assert_eq!(config.smart_popup.results_per_page, 3);
        assert_eq!(config.smart_popup.frequency, Frequency::Hotkey);
        assert_eq!(config.algorithms.len(), 1);
        assert_eq!(config.algorithms[0].name, "Custom");
        assert_eq!(config.keybindings.preset, "emacs");
    }

    #[test]
    fn defaults_apply_for_missing_optional_fields() {
        let config = load("").unwrap();
        assert_eq!(config.unlink_finder.minimum_characters, 2);
        assert_eq!(config.smart_popup.results_per_page, 5);
        assert_eq!(config.smart_popup.frequency, Frequency::Always);
        assert_eq!(config.algorithms.len(), 1);
        assert_eq!(config.algorithms[0].name, "Default");
        assert_eq!(config.keybindings.preset, "vim");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn validate_fails_without_graph_name() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[graph]
name = ""
api_token = "token-123"
"#,
        );

        let msg = AppConfig::load_from_path(&path).unwrap_err().to_string();
        assert!(msg.contains("graph.name"));
    }

    #[test]
    fn validate_fails_without_api_token() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[graph]
name = "test-graph"
api_token = ""
"#,
        );

        let msg = AppConfig::load_from_path(&path).unwrap_err().to_string();
        assert!(msg.contains("api_token"));
    }

    #[test]
    fn rejects_zero_limits() {
        let msg = load("[unlink_finder]\nminimum_characters = 0\n")
            .unwrap_err()
            .to_string();
        assert!(msg.contains("minimum_characters"));

        let msg = load("[smart_popup]\nresults_per_page = 0\n")
            .unwrap_err()
            .to_string();
        assert!(msg.contains("results_per_page"));
    }

    #[test]
    fn rejects_unknown_algorithm_and_empty_script() {
        let msg = load("[[algorithms]]\nname = \"Magic\"\n").unwrap_err().to_string();
        assert!(msg.contains("Magic"));

        let msg = load("[[algorithms]]\nname = \"Custom\"\nfields = [\"  \"]\n")
            .unwrap_err()
            .to_string();
        assert!(msg.contains("script"));
    }

    #[test]
    fn rejects_custom_algorithm_without_fields() {
        let msg = load("[[algorithms]]\nname = \"Custom\"\n")
            .unwrap_err()
            .to_string();
        assert!(msg.contains("Custom algorithm needs a script as field 1"));

        assert!(load("[[algorithms]]\nname = \"Custom\"\nfields = [\"echo []\"]\n").is_ok());
    }

    #[test]
    fn rejects_unparseable_hotkey() {
        assert!(load("[smart_popup]\nhotkey = \"Hyper+m\"\n").is_err());
    }

    #[test]
    fn write_default_creates_loadable_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("subdir").join("config.toml");

        AppConfig::write_default(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("your-graph-name"));
        assert!(content.contains("[smart_popup]"));
        assert!(content.contains("[[algorithms]]"));
        // empty token fails validation until the user fills it in
        assert!(AppConfig::load_from_path(&path).is_err());
    }

    #[test]
    fn keybinding_overrides_parsed() {
        let config = load(
            r#"
[keybindings]
preset = "vim"

[keybindings.bindings]
quit = "Ctrl+q"
open_unlink_finder = "Ctrl+l"
"#,
        )
        .unwrap();
        assert_eq!(config.keybindings.bindings.get("quit").unwrap(), "Ctrl+q");
        assert_eq!(
            config.keybindings.bindings.get("open_unlink_finder").unwrap(),
            "Ctrl+l"
        );
    }

    #[test]
    fn relative_log_file_lives_in_config_dir() {
        let config = load("").unwrap();
        assert_eq!(
            config.log_path(Path::new("/tmp/cfg")),
            PathBuf::from("/tmp/cfg/roam-assistant.log")
        );
    }

    #[test]
    fn config_dir_returns_some() {
        assert!(AppConfig::config_dir().is_some());
    }
}

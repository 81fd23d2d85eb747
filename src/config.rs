use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Description of a recognised config key
#[derive(Debug, Clone)]
pub struct ConfigKey {
    pub name: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

pub static KNOWN_KEYS: &[ConfigKey] = &[
    ConfigKey {
        name: "attention_threshold",
        default: "50",
        description: "Contacts at or below this score need attention (0-100)",
    },
    ConfigKey {
        name: "birthday_limit",
        default: "5",
        description: "How many upcoming birthdays the dashboard shows",
    },
];

pub const DEFAULT_ATTENTION_THRESHOLD: u8 = 50;
pub const DEFAULT_BIRTHDAY_LIMIT: usize = 5;

/// Configuration manager for a .circle directory
pub struct CircleConfig {
    circle_path: PathBuf,
    config_file: PathBuf,
    config: HashMap<String, serde_yaml::Value>,
}

impl CircleConfig {
    pub fn new(circle_path: PathBuf) -> Self {
        let config_file = circle_path.join("_config.yaml");
        let mut instance = Self {
            circle_path,
            config_file,
            config: HashMap::new(),
        };
        instance.load();
        instance
    }

    fn load(&mut self) {
        if self.config_file.exists() {
            match fs::read_to_string(&self.config_file) {
                Ok(content) => {
                    match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                        Ok(config) => self.config = config,
                        Err(e) => log::warn!(
                            "ignoring malformed {}: {}",
                            self.config_file.display(),
                            e
                        ),
                    }
                }
                Err(e) => log::warn!("could not read {}: {}", self.config_file.display(), e),
            }
        }
    }

    fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.circle_path)?;
        let content = serde_yaml::to_string(&self.config)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).and_then(|v| match v {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Set a value. Known keys are checked before anything is written.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "attention_threshold" => {
                parse_threshold(value)?;
            }
            "birthday_limit" => {
                parse_limit(value)?;
            }
            _ => {}
        }

        self.config
            .insert(key.to_string(), serde_yaml::Value::String(value.to_string()));
        self.save()
    }

    pub fn attention_threshold(&self) -> u8 {
        self.get("attention_threshold")
            .and_then(|v| parse_threshold(&v).ok())
            .unwrap_or(DEFAULT_ATTENTION_THRESHOLD)
    }

    pub fn birthday_limit(&self) -> usize {
        self.get("birthday_limit")
            .and_then(|v| parse_limit(&v).ok())
            .unwrap_or(DEFAULT_BIRTHDAY_LIMIT)
    }

    /// All stored keys and values, sorted by key
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .config
            .keys()
            .filter_map(|k| self.get(k).map(|v| (k.clone(), v)))
            .collect();
        entries.sort();
        entries
    }
}

fn parse_threshold(value: &str) -> Result<u8> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|v| *v <= crate::types::MAX_SCORE)
        .ok_or_else(|| {
            Error::Validation(format!(
                "attention_threshold must be an integer between 0 and 100, got '{}'",
                value
            ))
        })
}

fn parse_limit(value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| {
        Error::Validation(format!(
            "birthday_limit must be a non-negative integer, got '{}'",
            value
        ))
    })
}

/// Find the .circle directory, searching upward from current directory
pub fn find_circle_path() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let circle = current.join(".circle");
        if circle.is_dir() {
            return Some(circle);
        }

        if !current.pop() {
            break;
        }
    }

    // Check CIRCLE_PATH environment variable
    if let Ok(path) = std::env::var("CIRCLE_PATH") {
        let circle = PathBuf::from(path);
        if circle.is_dir() {
            return Some(circle);
        }
    }

    // Fall back to a workspace in the home directory
    let home = dirs::home_dir()?.join(".circle");
    if home.is_dir() {
        return Some(home);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();
        let config = CircleConfig::new(dir.clone());
        assert_eq!(config.attention_threshold(), 50);
        assert_eq!(config.birthday_limit(), 5);
        assert!(config.entries().is_empty());
    }

    #[test]
    fn test_set_persists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();
        let mut config = CircleConfig::new(dir.clone());
        config.set("attention_threshold", "30").unwrap();
        config.set("birthday_limit", "3").unwrap();
        config.set("nickname", "home").unwrap();

        let reloaded = CircleConfig::new(dir.clone());
        assert_eq!(reloaded.attention_threshold(), 30);
        assert_eq!(reloaded.birthday_limit(), 3);
        assert_eq!(reloaded.get("nickname").as_deref(), Some("home"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();
        let mut config = CircleConfig::new(dir.clone());
        assert!(matches!(config.set("attention_threshold", "150"), Err(Error::Validation(_))));
        assert!(matches!(config.set("birthday_limit", "-1"), Err(Error::Validation(_))));
        assert_eq!(config.attention_threshold(), 50);
        assert!(config.get("attention_threshold").is_none());
    }
}

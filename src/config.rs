use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::game::GameKind;
use crate::session::PollPolicy;

/// Highest Classic difficulty level.
pub const MAX_LEVEL: u8 = 5;
/// Highest Cascade difficulty level.
pub const MAX_CASCADE_LEVEL: u8 = 4;

/// Difficulty levels offered for `kind`.
pub fn level_range(kind: GameKind) -> RangeInclusive<u8> {
    match kind {
        GameKind::Classic => 1..=MAX_LEVEL,
        GameKind::Cascade => 1..=MAX_CASCADE_LEVEL,
    }
}

/// Reject a difficulty level outside [`level_range`].
pub fn check_level(kind: GameKind, level: u8) -> Result<(), ConfigError> {
    let range = level_range(kind);
    if range.contains(&level) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{kind} level must be in [{}, {}], got {level}",
            range.start(),
            range.end()
        )))
    }
}

/// Computer opponent difficulty per game.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// 1 plays randomly, `n >= 2` searches `n + 1` plies.
    pub classic_level: u8,
    /// 1 plays randomly, 2..=4 enable scoring, blocking and center bonuses.
    pub cascade_level: u8,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            classic_level: 3,
            cascade_level: 4,
        }
    }
}

/// Shared store location and polling behaviour for networked play.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub database: PathBuf,
    pub poll_initial_ms: u64,
    pub poll_max_ms: u64,
    pub poll_backoff: u32,
    /// 0 waits for the opponent indefinitely.
    pub wait_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            database: PathBuf::from("connect_cascade.db"),
            poll_initial_ms: 250,
            poll_max_ms: 3000,
            poll_backoff: 2,
            wait_timeout_secs: 0,
        }
    }
}

impl SessionConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            initial: Duration::from_millis(self.poll_initial_ms),
            max: Duration::from_millis(self.poll_max_ms),
            factor: self.poll_backoff,
            timeout: (self.wait_timeout_secs > 0)
                .then(|| Duration::from_secs(self.wait_timeout_secs)),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log spec such as `info` or `connect_cascade=debug`; `RUST_LOG` wins.
    pub level: String,
    /// Log to rotating files in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub rotate_mb: u64,
    pub keep_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            directory: None,
            rotate_mb: 10,
            keep_files: 3,
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            eprintln!("Warning: config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_level(GameKind::Classic, self.ai.classic_level)?;
        check_level(GameKind::Cascade, self.ai.cascade_level)?;

        if self.session.poll_initial_ms == 0 {
            return Err(ConfigError::Validation(
                "session.poll_initial_ms must be > 0".into(),
            ));
        }
        if self.session.poll_max_ms < self.session.poll_initial_ms {
            return Err(ConfigError::Validation(
                "session.poll_max_ms must be >= session.poll_initial_ms".into(),
            ));
        }
        if self.session.poll_backoff == 0 {
            return Err(ConfigError::Validation(
                "session.poll_backoff must be >= 1".into(),
            ));
        }
        if self.session.database.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "session.database must not be empty".into(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging.level must not be empty".into(),
            ));
        }
        if self.logging.directory.is_some() && self.logging.rotate_mb == 0 {
            return Err(ConfigError::Validation(
                "logging.rotate_mb must be > 0".into(),
            ));
        }
        if self.logging.keep_files == 0 {
            return Err(ConfigError::Validation(
                "logging.keep_files must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[ai]
classic_level = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ai.classic_level, 5);
        // Other fields should be defaults
        assert_eq!(config.ai.cascade_level, 4);
        assert_eq!(config.session.poll_initial_ms, 250);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        let default = AppConfig::default();
        assert_eq!(config.session.database, default.session.database);
        assert_eq!(config.logging.keep_files, default.logging.keep_files);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_validation_rejects_levels_out_of_range() {
        let mut config = AppConfig::default();
        config.ai.classic_level = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ai.classic_level = 6;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ai.cascade_level = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_level_bounds_per_game() {
        assert!(check_level(GameKind::Classic, 5).is_ok());
        assert!(check_level(GameKind::Cascade, 4).is_ok());
        assert!(matches!(
            check_level(GameKind::Classic, 200),
            Err(ConfigError::Validation(_))
        ));
        assert!(check_level(GameKind::Cascade, 5).is_err());
        assert!(check_level(GameKind::Classic, 0).is_err());
        assert_eq!(level_range(GameKind::Cascade), 1..=4);
    }

    #[test]
    fn test_validation_rejects_poll_settings() {
        let mut config = AppConfig::default();
        config.session.poll_initial_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.session.poll_max_ms = 100;
        config.session.poll_initial_ms = 500;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.session.poll_backoff = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_logging_settings() {
        let mut config = AppConfig::default();
        config.logging.level = "  ".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.directory = Some(PathBuf::from("logs"));
        config.logging.rotate_mb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_policy_from_session_config() {
        let mut session = SessionConfig::default();
        let policy = session.poll_policy();
        assert_eq!(policy.initial, Duration::from_millis(250));
        assert_eq!(policy.max, Duration::from_secs(3));
        assert_eq!(policy.factor, 2);
        assert_eq!(policy.timeout, None);

        session.wait_timeout_secs = 30;
        assert_eq!(session.poll_policy().timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config.ai.classic_level, 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[session]
database = "rooms.db"
wait_timeout_secs = 60

[logging]
directory = "logs"
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.session.database, PathBuf::from("rooms.db"));
        assert_eq!(config.session.wait_timeout_secs, 60);
        assert_eq!(config.logging.directory, Some(PathBuf::from("logs")));
        // Others are defaults
        assert_eq!(config.session.poll_backoff, 2);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[ai]\ncascade_level = 9\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));

        std::fs::write(&path, "[ai\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml().unwrap();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
    }
}

pub mod resolve;
pub mod run;
pub mod status;

use std::path::Path;

use relayclaw_config::{AppConfig, ConfigError};

/// Load the config from `path`, or from the default location. Environment
/// overrides apply either way.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env_overrides(|name| std::env::var(name).ok());
            Ok(config)
        }
        None => AppConfig::load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_path_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = \"glm-4.7-flash\"").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        // RELAYCLAW_MODEL may be set in the environment running the tests
        if std::env::var("RELAYCLAW_MODEL").is_err() {
            assert_eq!(config.default_model, "glm-4.7-flash");
        }
    }

    #[test]
    fn invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = [").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ConfigError::ParseError { .. })
        ));
    }
}

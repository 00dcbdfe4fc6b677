use std::env;
use std::path::PathBuf;

use terrasense_core::{AppError, AppResult};

/// Runtime settings of the console driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub scenario_path: PathBuf,
    pub actor_id: i64,
    pub apply: bool,
}

impl ConsoleConfig {
    /// Reads settings from the environment; `argument` overrides `CONSOLE_SCENARIO_PATH`.
    pub fn load(argument: Option<String>) -> AppResult<Self> {
        let scenario_path = match argument.filter(|value| !value.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(required_env("CONSOLE_SCENARIO_PATH")?),
        };
        let actor_id = parse_env_i64("CONSOLE_ACTOR_ID", 1)?;
        let apply = parse_env_bool("CONSOLE_APPLY", false)?;

        if actor_id <= 0 {
            return Err(AppError::Validation(
                "CONSOLE_ACTOR_ID must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            scenario_path,
            actor_id,
            apply,
        })
    }
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_i64(name: &str, default: i64) -> AppResult<i64> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<i64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> AppResult<bool> {
    match env::var(name) {
        Ok(value) => parse_bool(name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_bool(name: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "invalid {name} value '{value}': expected true or false"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(matches!(parse_bool("CONSOLE_APPLY", " TRUE "), Ok(true)));
        assert!(matches!(parse_bool("CONSOLE_APPLY", "0"), Ok(false)));
        assert!(parse_bool("CONSOLE_APPLY", "maybe").is_err());
    }
}

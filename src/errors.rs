use rule_config::ConfigError;
use rule_core::CoreError;
use thiserror::Error;

/// Failures surfaced by the command-line front end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A request the engine declined, such as an overdrawing expense.
    #[error("{0}")]
    Rejected(String),
}

impl CliError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidInput(_)
            | CliError::Core(CoreError::Validation(_))
            | CliError::Config(ConfigError::InvalidSetting { .. }) => 2,
            CliError::Rejected(_) => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_values_exit_as_invalid_input() {
        let validation = CliError::from(CoreError::Validation("amount".into()));
        assert_eq!(validation.exit_code(), 2);
        let setting = CliError::from(ConfigError::InvalidSetting {
            key: "trailing_months".into(),
            reason: "out of range".into(),
        });
        assert_eq!(setting.exit_code(), 2);
        assert_eq!(CliError::Rejected("overdraw".into()).exit_code(), 3);
        assert_eq!(
            CliError::from(CoreError::Storage("offline".into())).exit_code(),
            1
        );
    }
}

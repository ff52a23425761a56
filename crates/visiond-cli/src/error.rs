// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments
    InvalidArgs(String),
    /// Fatal configuration problem (unreadable file, empty manual pipeline)
    Configuration(String),
    /// Any other failure
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::Configuration(_) => ExitCode::from(3),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

/// Map visiond::Error to CliError with appropriate exit codes
impl From<visiond::Error> for CliError {
    fn from(err: visiond::Error) -> Self {
        use visiond::Error;

        match err {
            Error::Configuration(msg) => CliError::Configuration(msg),
            // A malformed config file is a configuration problem too
            Error::Json(json_err) => {
                CliError::Configuration(format!("invalid configuration file: {}", json_err))
            }
            Error::Io(io_err) => CliError::General(format!("I/O error: {}", io_err)),
            other => CliError::General(other.to_string()),
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::InvalidArgs("test".into()).exit_code(),
            ExitCode::from(2)
        );
        assert_eq!(
            CliError::Configuration("test".into()).exit_code(),
            ExitCode::from(3)
        );
        assert_eq!(
            CliError::General("test".into()).exit_code(),
            ExitCode::from(1)
        );
    }

    #[test]
    fn test_error_display() {
        let err = CliError::Configuration("pipeline_override is empty".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: pipeline_override is empty"
        );
    }

    #[test]
    fn test_from_library_error() {
        let err = CliError::from(visiond::Error::Configuration("x".into()));
        assert!(matches!(err, CliError::Configuration(_)));

        let err = CliError::from(visiond::Error::NoCameraFound);
        assert_eq!(err.to_string(), "Error: Error detecting camera video device");

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CliError::from(visiond::Error::from(json_err));
        assert!(matches!(err, CliError::Configuration(_)));
    }
}

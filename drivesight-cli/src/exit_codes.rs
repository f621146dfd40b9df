//! Exit codes following sysexits.h conventions.
//!
//! Scripts can tell a rejected input apart from an unreachable model.

use drivesight_core::Error as CoreError;

use crate::utils::DegradedAssessment;

/// Successful execution.
pub const SUCCESS: u8 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: u8 = 1;

/// Command line usage or configuration error (EX_USAGE).
pub const USAGE_ERROR: u8 = 64;

/// Input is not an image or not a valid perception document (EX_DATAERR).
pub const DATA_ERROR: u8 = 65;

/// Cannot open input file (EX_NOINPUT).
pub const INPUT_ERROR: u8 = 66;

/// Perception or summary service unavailable (EX_UNAVAILABLE).
pub const UNAVAILABLE: u8 = 69;

/// I/O error writing output (EX_IOERR).
pub const IO_ERROR: u8 = 74;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: u8,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let code = if err.downcast_ref::<DegradedAssessment>().is_some() {
            UNAVAILABLE
        } else if let Some(core) = err.downcast_ref::<CoreError>() {
            match core {
                CoreError::MalformedInput(_) => DATA_ERROR,
                CoreError::Config(_) => USAGE_ERROR,
                CoreError::AdapterTimeout { .. } | CoreError::AdapterError { .. } => UNAVAILABLE,
                CoreError::CacheInternal(_) => GENERAL_ERROR,
            }
        } else if err.downcast_ref::<serde_json::Error>().is_some() {
            DATA_ERROR
        } else if message.starts_with("Failed to read") {
            INPUT_ERROR
        } else if message.starts_with("Failed to write") {
            IO_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use drivesight_core::Stage;

    use super::*;

    #[test]
    fn test_malformed_input_is_data_error() {
        let err = anyhow::Error::new(CoreError::MalformedInput("empty".into()));
        assert_eq!(ExitCode::from_anyhow(&err).code, DATA_ERROR);
    }

    #[test]
    fn test_config_is_usage_error() {
        let err = anyhow::Error::new(CoreError::Config("GEMINI_API_KEY not set".into()));
        assert_eq!(ExitCode::from_anyhow(&err).code, USAGE_ERROR);
    }

    #[test]
    fn test_context_does_not_hide_core_error() {
        let err = Err::<(), _>(CoreError::adapter(Stage::Perception, "503"))
            .context("Assessment failed")
            .unwrap_err();
        assert_eq!(ExitCode::from_anyhow(&err).code, UNAVAILABLE);
    }

    #[test]
    fn test_degraded_assessment_is_unavailable() {
        let err = anyhow::Error::new(DegradedAssessment("perception timed out".into()));
        let exit = ExitCode::from_anyhow(&err);
        assert_eq!(exit.code, UNAVAILABLE);
        assert!(exit.message.unwrap().contains("perception timed out"));
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = Err::<(), _>(std::io::Error::from(std::io::ErrorKind::NotFound))
            .context("Failed to read file: scene.jpg")
            .unwrap_err();
        assert_eq!(ExitCode::from_anyhow(&err).code, INPUT_ERROR);
    }
}

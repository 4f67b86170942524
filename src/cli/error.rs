//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(DomainError::NodeNotFound) => {
                        crate::exitcode::SOFTWARE
                    }
                    ApplicationError::Domain(_) | ApplicationError::Json { .. } => {
                        crate::exitcode::DATAERR
                    }
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exitcode;

    #[test]
    fn given_domain_errors_when_mapping_then_data_error_code() {
        let err = CliError::from(ApplicationError::Domain(DomainError::CyclicAncestry(
            "1".into(),
        )));
        assert_eq!(err.exit_code(), exitcode::DATAERR);
    }

    #[test]
    fn given_config_error_when_mapping_then_config_code() {
        let err = CliError::from(ApplicationError::Config {
            message: "bad".into(),
        });
        assert_eq!(err.exit_code(), exitcode::CONFIG);
    }

    #[test]
    fn given_io_error_when_mapping_then_ioerr_code() {
        let err = CliError::from(InfraError::io(
            "cwd",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        ));
        assert_eq!(err.exit_code(), exitcode::IOERR);
        assert_eq!(CliError::Usage("x".into()).exit_code(), exitcode::USAGE);
    }
}

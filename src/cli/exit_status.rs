use std::process::ExitCode;

/// Exit status for CLI commands.
///
/// - `Success` (0): command completed, every phrase resolved
/// - `Failure` (1): command completed but phrases remain unresolved
/// - `Error` (2): fatal error (configuration, missing translation in production, corrupt locale file)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}

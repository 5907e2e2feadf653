//! Per-matcher diagnostic line sink.

use crate::collaborator::CollaboratorError;
use log::info;

/// String consumer receiving one line per cascade stage outcome.
///
/// Errors are ignored by the matcher.
pub trait ResolutionLogger: Send + Sync {
    fn log_line(&self, line: &str) -> Result<(), CollaboratorError>;
}

impl<F> ResolutionLogger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log_line(&self, line: &str) -> Result<(), CollaboratorError> {
        self(line);
        Ok(())
    }
}

/// Forwards lines to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacadeLogger;

impl ResolutionLogger for LogFacadeLogger {
    fn log_line(&self, line: &str) -> Result<(), CollaboratorError> {
        info!("event=resolve_stage module=matcher {line}");
        Ok(())
    }
}

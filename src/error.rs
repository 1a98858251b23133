use std::path::PathBuf;

/// Errors raised by the sweep library.
#[derive(Debug)]
pub enum SweepError {
    /// Invalid range bounds or non-positive parameters; raised before any work.
    Configuration(String),
    /// The big-integer evaluation produced a value the oracle cannot be
    /// trusted with (non-positive Q(n)). Fatal, never retried.
    Arithmetic { n: u64, detail: String },
    /// Reading or writing an artifact or checkpoint failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SweepError {
    pub fn config(msg: impl Into<String>) -> Self {
        SweepError::Configuration(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SweepError::Io {
            path: path.into(),
            source,
        }
    }
}

impl std::fmt::Display for SweepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            SweepError::Arithmetic { n, detail } => {
                write!(f, "arithmetic fault evaluating Q({}): {}", n, detail)
            }
            SweepError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

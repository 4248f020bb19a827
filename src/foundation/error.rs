use std::path::{Path, PathBuf};

pub type SpritifyResult<T> = Result<T, SpritifyError>;

#[derive(thiserror::Error, Debug)]
pub enum SpritifyError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("binary not found: '{}' (is ImageMagick installed, and is the bin directory correct?)", .program.display())]
    BinaryNotFound { program: PathBuf },

    #[error("invalid frame set: {0}")]
    InvalidFrameSet(String),

    #[error("{tool} failed ({status}): {stderr}")]
    ExternalToolFailure {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("output path '{}' is not writable: {reason}", .path.display())]
    OutputPathUnwritable { path: PathBuf, reason: String },

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpritifyError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn binary_not_found(program: impl Into<PathBuf>) -> Self {
        Self::BinaryNotFound {
            program: program.into(),
        }
    }

    pub fn invalid_frames(msg: impl Into<String>) -> Self {
        Self::InvalidFrameSet(msg.into())
    }

    pub fn tool_failure(
        tool: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ExternalToolFailure {
            tool: tool.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    pub fn unwritable(path: &Path, reason: impl Into<String>) -> Self {
        Self::OutputPathUnwritable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

//! Per-element patch errors.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Why one element could not be patched. Never aborts a batch.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("file `{0}` not found under the project root")]
    NotFound(String),

    #[error("no marker or size call for `{component} - {element}` in `{}`", path.display())]
    NoTargetIdentified {
        component: String,
        element: String,
        path: PathBuf,
    },

    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Failure category carried in batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    NotFound,
    NoTargetIdentified,
    Io,
}

impl PatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) => FailureKind::NotFound,
            Self::NoTargetIdentified { .. } => FailureKind::NoTargetIdentified,
            Self::Io(..) => FailureKind::Io,
        }
    }

    /// Message including the IO source, if any.
    pub fn detail(&self) -> String {
        match self {
            Self::Io(_, source) => format!("{self}: {source}"),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_detail() {
        let err = PatchError::NotFound("Card.tsx".into());
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert!(err.detail().contains("Card.tsx"));

        let err = PatchError::Io(
            PathBuf::from("a.tsx"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), FailureKind::Io);
        assert!(err.detail().ends_with("denied"));
    }
}

//! Error taxonomy for a report run.

use crate::types::Role;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Required roles could not be matched to any column.
    #[error("required column(s) not found: {}; select them manually", join_roles(.roles))]
    UnresolvedColumns { roles: Vec<Role> },

    /// A manual column override names a column the dataset does not have.
    #[error("column '{column}' selected for {role} does not exist in the dataset")]
    UnknownColumn { role: Role, column: String },

    #[error("dataset has no header row")]
    EmptyDataset,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("unsupported input format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to export {path}: {message}")]
    Export { path: PathBuf, message: String },

    /// Anything that went wrong while processing rows. No tables are produced.
    #[error("error processing dataset: {0}")]
    Unexpected(String),
}

impl ReportError {
    /// Fatal configuration problems the user can fix by choosing columns.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ReportError::UnresolvedColumns { .. } | ReportError::UnknownColumn { .. }
        )
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_message_lists_roles() {
        let err = ReportError::UnresolvedColumns {
            roles: vec![Role::Cost, Role::Quantity],
        };
        assert_eq!(
            err.to_string(),
            "required column(s) not found: cost, quantity; select them manually"
        );
        assert!(err.is_configuration());
        assert!(!ReportError::Unexpected("boom".into()).is_configuration());
    }
}

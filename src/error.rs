// =============================================================================
// ERROR : Taxonomie des erreurs
// =============================================================================
//
//   ValidationError : paramètres invalides, rejetés AVANT tout accès au store
//   PlanError       : spec incohérente avec le schéma (bug de catalogue)
//   StorageError    : échec du store, propagé tel quel, sans retry
//   ConfigError     : configuration d'environnement invalide
//
// Un identifiant inconnu n'est PAS une erreur : le rapport est simplement vide.
//
// =============================================================================

use thiserror::Error;

use crate::core::typeside::BaseType;
use crate::core::validate::SchemaIssue;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unknown report: {0}")]
    UnknownReport(String),

    #[error("report {report} expects {expected} parameter(s), got {found}")]
    Arity {
        report: String,
        expected: usize,
        found: usize,
    },

    #[error("parameter {param}: {raw:?} is not an integer identifier")]
    NotAnInteger { param: String, raw: String },

    #[error("parameter {param}: expected {expected}, got {found}")]
    TypeMismatch {
        param: String,
        expected: BaseType,
        found: String,
    },
}

#[derive(Error, Debug)]
#[error("report {report} does not match the schema: {}", display_issues(.issues))]
pub struct PlanError {
    pub report: String,
    pub issues: Vec<SchemaIssue>,
}

fn display_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("column {column}: cannot decode value as {expected}")]
    Decode { column: String, expected: BaseType },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?} ({reason})")]
    InvalidVar {
        var: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<rusqlite::Error> for ReportError {
    fn from(e: rusqlite::Error) -> Self {
        ReportError::Storage(StorageError::Sqlite(e))
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

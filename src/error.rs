//! Load error types / 加载错误类型

use std::path::PathBuf;
use thiserror::Error;

use crate::search::TableKind;

pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that fail a whole load attempt / 导致整次加载失败的错误
///
/// Data-quality gaps (orphan rows, bad numbers) are not errors; they are
/// counted in [`crate::search::JoinReport`].
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{table} source unavailable at {path:?}: {source}")]
    SourceUnavailable {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{table} source is malformed: {source}")]
    Malformed {
        table: TableKind,
        #[source]
        source: csv::Error,
    },

    #[error("{table} source is missing required column '{column}'")]
    MissingColumn { table: TableKind, column: &'static str },

    #[error("load task failed: {0}")]
    Task(String),
}

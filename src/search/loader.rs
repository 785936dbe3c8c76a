//! Raw table loader / 原始表加载
//!
//! Tables arrive as CSV text with a header row. Every value stays a string at
//! this layer; typing happens in [`crate::models`] and the joiner.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{LoadError, Result};
use crate::models::{Project, ProjectAddress, ProjectConfiguration, ProjectConfigurationVariant};

/// One data row: column name -> text value / 一行数据
pub type RawRow = HashMap<String, String>;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The four source tables / 四张源表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Project,
    ProjectAddress,
    ProjectConfiguration,
    ProjectConfigurationVariant,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Project,
        TableKind::ProjectAddress,
        TableKind::ProjectConfiguration,
        TableKind::ProjectConfigurationVariant,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Project => "Project",
            TableKind::ProjectAddress => "ProjectAddress",
            TableKind::ProjectConfiguration => "ProjectConfiguration",
            TableKind::ProjectConfigurationVariant => "ProjectConfigurationVariant",
        }
    }

    /// Columns the table must carry, addressed by name / 必需列
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Project => Project::COLUMNS,
            TableKind::ProjectAddress => ProjectAddress::COLUMNS,
            TableKind::ProjectConfiguration => ProjectConfiguration::COLUMNS,
            TableKind::ProjectConfigurationVariant => ProjectConfigurationVariant::COLUMNS,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read and parse one table source / 读取并解析一张表
///
/// The read is async; parsing runs on the blocking pool.
pub async fn load_table(kind: TableKind, path: PathBuf) -> Result<Vec<RawRow>> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| LoadError::SourceUnavailable {
            table: kind,
            path: path.clone(),
            source,
        })?;

    let rows = tokio::task::spawn_blocking(move || parse_table(kind, &bytes))
        .await
        .map_err(|e| LoadError::Task(e.to_string()))??;

    tracing::debug!("Loaded {} rows from {} ({:?})", rows.len(), kind, path);
    Ok(rows)
}

/// Parse CSV bytes into rows, checking the header against the required columns
pub fn parse_table(kind: TableKind, bytes: &[u8]) -> Result<Vec<RawRow>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let malformed = |source: csv::Error| LoadError::Malformed { table: kind, source };

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_string)
        .collect();

    if let Some(&column) = kind
        .required_columns()
        .iter()
        .find(|column| !headers.iter().any(|h| h == *column))
    {
        return Err(LoadError::MissingColumn { table: kind, column });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        let row: RawRow = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

//! Bulk loading of reference data (ingredients, tags) from CSV files.

use std::{fmt, fs::File, path::Path};

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

pub mod parse;
pub mod repo;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file {path} not found")]
    NotFound { path: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {reason}")]
    Malformed { line: u64, reason: String },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: u64,
    pub skipped: u64,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} inserted, {} skipped", self.inserted, self.skipped)
    }
}

fn open(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|e| {
        let path = path.display().to_string();
        match e.kind() {
            std::io::ErrorKind::NotFound => ImportError::NotFound { path },
            _ => ImportError::Io { path, source: e },
        }
    })
}

pub async fn import_ingredients(db: &PgPool, path: &Path) -> Result<ImportSummary, ImportError> {
    let records = parse::parse_ingredients(open(path)?)?;
    let summary = repo::upsert_ingredients(db, &records).await?;
    info!(path = %path.display(), %summary, "ingredients imported");
    Ok(summary)
}

pub async fn import_tags(db: &PgPool, path: &Path) -> Result<ImportSummary, ImportError> {
    let records = parse::parse_tags(open(path)?)?;
    let summary = repo::upsert_tags(db, &records).await?;
    info!(path = %path.display(), %summary, "tags imported");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_by_path() {
        let err = open(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ImportError::NotFound { .. }));
        assert_eq!(err.to_string(), "file /definitely/not/here.csv not found");
    }

    #[test]
    fn summary_display() {
        let s = ImportSummary {
            inserted: 3,
            skipped: 1,
        };
        assert_eq!(s.to_string(), "3 inserted, 1 skipped");
    }
}

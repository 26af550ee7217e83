//! Column descriptors derived from cursor metadata.

use serde::Serialize;
use tracing::debug;

use crate::cursor::ColumnMeta;
use crate::error::{ExportError, Result};

/// Coarse classification of a column's database type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Character data, and anything not otherwise recognized.
    Text,
    /// Integer, decimal, floating point and boolean types.
    Numeric,
    /// Dates, times, timestamps and intervals.
    Temporal,
    /// Raw binary data. Cannot be exported.
    Binary,
}

impl ColumnKind {
    /// Classifies a database type name such as `VARCHAR(20)` or
    /// `DOUBLE PRECISION`. Matching ignores case, size arguments and modifiers.
    pub fn classify(type_name: &str) -> Self {
        let upper = type_name.trim().to_ascii_uppercase();
        let base = upper
            .split(|c: char| c == '(' || c.is_ascii_whitespace())
            .next()
            .unwrap_or_default();
        match base {
            "BINARY" | "VARBINARY" | "IMAGE" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB"
            | "LONGBLOB" | "BYTEA" | "RAW" | "BFILE" => ColumnKind::Binary,
            "INT" | "INTEGER" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "BIGINT" | "INT2"
            | "INT4" | "INT8" | "UNSIGNED" | "SERIAL" | "BIGSERIAL" | "DECIMAL" | "DEC"
            | "NUMERIC" | "NUMBER" | "REAL" | "FLOAT" | "FLOAT4" | "FLOAT8" | "DOUBLE"
            | "MONEY" | "SMALLMONEY" | "BIT" | "BOOL" | "BOOLEAN" => ColumnKind::Numeric,
            "DATE" | "TIME" | "TIMETZ" | "DATETIME" | "DATETIME2" | "SMALLDATETIME"
            | "DATETIMEOFFSET" | "TIMESTAMP" | "TIMESTAMPTZ" | "INTERVAL" | "YEAR" => {
                ColumnKind::Temporal
            }
            _ => ColumnKind::Text,
        }
    }

    /// Lowercase label used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Binary => "binary",
        }
    }
}

/// One output column, resolved once per query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// Zero-based position in the result.
    pub ordinal: usize,
    /// Header name; synthesized as `column_<n>` when the driver reports none.
    pub name: String,
    /// Database-reported type name.
    pub type_name: String,
    /// Classification of `type_name`.
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    fn from_meta(ordinal: usize, meta: &ColumnMeta) -> Self {
        let name = if meta.name.is_empty() {
            format!("column_{}", ordinal + 1)
        } else {
            meta.name.clone()
        };
        Self {
            ordinal,
            name,
            type_name: meta.type_name.clone(),
            kind: ColumnKind::classify(&meta.type_name),
        }
    }
}

/// Resolves the ordered output columns of a result.
///
/// Fails on an empty schema and on the first column classified as
/// [`ColumnKind::Binary`].
pub fn describe_columns(metas: &[ColumnMeta]) -> Result<Vec<ColumnDescriptor>> {
    if metas.is_empty() {
        return Err(ExportError::NoColumns);
    }
    let mut columns = Vec::with_capacity(metas.len());
    for (ordinal, meta) in metas.iter().enumerate() {
        let column = ColumnDescriptor::from_meta(ordinal, meta);
        debug!(
            ordinal,
            name = %column.name,
            type_name = %column.type_name.to_ascii_lowercase(),
            kind = column.kind.as_str(),
            "export.schema.column"
        );
        if column.kind == ColumnKind::Binary {
            return Err(ExportError::UnsupportedColumn {
                ordinal,
                name: column.name,
                type_name: column.type_name,
            });
        }
        columns.push(column);
    }
    Ok(columns)
}

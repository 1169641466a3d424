use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The closed set of column types the inspection query knows how to profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    String,
    Boolean,
    Integer,
    Float,
    Timestamp,
    Date,
}

impl DeclaredType {
    pub const ALL: [DeclaredType; 6] = [
        DeclaredType::String,
        DeclaredType::Boolean,
        DeclaredType::Integer,
        DeclaredType::Float,
        DeclaredType::Timestamp,
        DeclaredType::Date,
    ];

    /// Exact match against an already upper-cased label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclaredType::String => "STRING",
            DeclaredType::Boolean => "BOOLEAN",
            DeclaredType::Integer => "INTEGER",
            DeclaredType::Float => "FLOAT",
            DeclaredType::Timestamp => "TIMESTAMP",
            DeclaredType::Date => "DATE",
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            DeclaredType::String => TypeKind::StringLike,
            _ => TypeKind::Scalar,
        }
    }
}

/// Selects which aggregate branch a column is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    StringLike,
    Scalar,
}

/// One row of the column table: a name and the type label the user typed.
///
/// The type is kept as text so that half-edited rows (empty or unknown
/// types) survive in the table; they are simply skipped at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(rename = "col_name")]
    pub name: String,
    #[serde(rename = "data_type")]
    pub declared_type: String,
}

impl ColumnSpec {
    pub fn new(name: &str, declared_type: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            declared_type: declared_type.trim().to_uppercase(),
        }
    }

    /// The rows shown before anything has been pasted or typed.
    pub fn placeholder_rows() -> Vec<ColumnSpec> {
        vec![ColumnSpec::new("", "STRING"), ColumnSpec::new("", "TIMESTAMP")]
    }

    /// Returns the recognized type when this row can be rendered.
    pub fn usable_type(&self) -> Option<DeclaredType> {
        if self.name.is_empty() || self.declared_type.is_empty() {
            return None;
        }
        DeclaredType::from_label(&self.declared_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFilter {
    pub enabled: bool,
    pub column: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateFilter {
    /// Renders the WHERE clause, or an empty string when the filter is off.
    /// Values are interpolated as given.
    pub fn where_clause(&self) -> String {
        if !self.enabled {
            return String::new();
        }
        format!(
            "WHERE DATE({}) BETWEEN '{}' AND '{}'",
            self.column,
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }

    /// True when the range can match nothing because start is after end.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub table_reference: String,
    pub columns: Vec<ColumnSpec>,
    pub date_filter: Option<DateFilter>,
}

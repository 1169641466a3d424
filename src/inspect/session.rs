use tracing::{debug, warn};

use crate::inspect::builder::QueryBuilder;
use crate::inspect::parser::parse_tsv;
use crate::inspect::schema::{ColumnSpec, DateFilter, QueryRequest};
use crate::inspect::InspectError;

/// The editable column table one user works on between generations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTable {
    rows: Vec<ColumnSpec>,
}

impl Default for ColumnTable {
    fn default() -> Self {
        Self {
            rows: ColumnSpec::placeholder_rows(),
        }
    }
}

impl ColumnTable {
    pub fn current(&self) -> &[ColumnSpec] {
        &self.rows
    }

    /// Replaces every row. An empty replacement resets to the placeholder rows.
    pub fn replace(&mut self, rows: Vec<ColumnSpec>) {
        if rows.is_empty() {
            debug!("Empty column table submitted, restoring placeholder rows");
            self.rows = ColumnSpec::placeholder_rows();
        } else {
            self.rows = rows;
        }
    }

    /// Distinct non-empty column names, in table order. These are the
    /// choices offered for the date filter column.
    pub fn term_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            if !row.name.is_empty() && !names.contains(&row.name) {
                names.push(row.name.clone());
            }
        }
        names
    }
}

/// Per-user state kept across repeated generate actions.
#[derive(Debug, Clone)]
pub struct Session {
    pub columns: ColumnTable,
    pub date_filter: DateFilter,
    last_query: Option<String>,
}

impl Session {
    pub fn new(date_filter: DateFilter) -> Self {
        Self {
            columns: ColumnTable::default(),
            date_filter,
            last_query: None,
        }
    }

    /// Parses pasted TSV into the column table. When nothing usable was
    /// pasted the table is left as it was.
    pub fn apply_paste(&mut self, raw_text: &str) -> Result<usize, InspectError> {
        let rows = parse_tsv(raw_text);
        if rows.is_empty() {
            warn!("Paste produced no column rows; keeping the current table");
            return Err(InspectError::InvalidPaste);
        }

        let count = rows.len();
        self.columns.replace(rows);
        Ok(count)
    }

    /// Builds the query from the current table. A successful result becomes
    /// the session's last query; a failure leaves the previous one in place.
    pub fn generate(
        &mut self,
        builder: &QueryBuilder,
        table_reference: &str,
        date_filter: Option<DateFilter>,
    ) -> Result<String, InspectError> {
        if let Some(filter) = &date_filter {
            self.date_filter = filter.clone();
        }

        let request = QueryRequest {
            table_reference: table_reference.to_string(),
            columns: self.columns.current().to_vec(),
            date_filter,
        };

        let query = builder.build(&request)?;
        self.last_query = Some(query.clone());
        Ok(query)
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn filter() -> DateFilter {
        DateFilter {
            enabled: false,
            column: "impression_date".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        }
    }

    #[test]
    fn starts_with_placeholder_rows() {
        let table = ColumnTable::default();
        assert_eq!(table.current(), ColumnSpec::placeholder_rows().as_slice());
        assert_eq!(table.current()[0].declared_type, "STRING");
        assert_eq!(table.current()[1].declared_type, "TIMESTAMP");
    }

    #[test]
    fn replace_swaps_rows_and_empty_restores_placeholder() {
        let mut table = ColumnTable::default();
        table.replace(vec![ColumnSpec::new("a", "STRING")]);
        assert_eq!(table.current().len(), 1);

        table.replace(Vec::new());
        assert_eq!(table.current(), ColumnSpec::placeholder_rows().as_slice());
    }

    #[test]
    fn term_columns_are_distinct_and_ordered() {
        let mut table = ColumnTable::default();
        table.replace(vec![
            ColumnSpec::new("event_date", "DATE"),
            ColumnSpec::new("", "STRING"),
            ColumnSpec::new("user_id", "STRING"),
            ColumnSpec::new("event_date", "TIMESTAMP"),
        ]);
        assert_eq!(table.term_columns(), vec!["event_date", "user_id"]);
    }

    #[test]
    fn invalid_paste_keeps_table() {
        let mut session = Session::new(filter());
        session.apply_paste("a\tSTRING").unwrap();

        let err = session.apply_paste("no tabs here").unwrap_err();
        assert!(matches!(err, InspectError::InvalidPaste));
        assert_eq!(session.columns.current(), &[ColumnSpec::new("a", "STRING")]);
    }

    #[test]
    fn failed_generate_keeps_last_query() {
        let builder = QueryBuilder::new().unwrap();
        let mut session = Session::new(filter());
        assert_eq!(session.apply_paste("a\tSTRING\nb\tDATE").unwrap(), 2);

        let query = session.generate(&builder, "p.d.t", None).unwrap();
        assert_eq!(session.last_query(), Some(query.as_str()));

        session.columns.replace(vec![ColumnSpec::new("", "STRING")]);
        let err = session.generate(&builder, "p.d.t", None).unwrap_err();
        assert!(matches!(err, InspectError::EmptyColumnSet));
        assert_eq!(session.last_query(), Some(query.as_str()));
    }

    #[test]
    fn generate_remembers_filter_settings() {
        let builder = QueryBuilder::new().unwrap();
        let mut session = Session::new(filter());
        session.apply_paste("a\tSTRING").unwrap();

        let mut enabled = filter();
        enabled.enabled = true;
        enabled.column = "a".to_string();
        let query = session.generate(&builder, "p.d.t", Some(enabled.clone())).unwrap();

        assert!(query.contains("WHERE DATE(a) BETWEEN '2025-03-01' AND '2025-03-31'"));
        assert_eq!(session.date_filter, enabled);
    }
}

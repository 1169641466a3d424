use minijinja::{context, Environment};
use tracing::{debug, info};

use crate::inspect::schema::{DateFilter, QueryRequest, TypeKind};
use crate::inspect::InspectError;

const SELECT_TEMPLATE: &str = "inspection_select.sql";

pub const UNION_SEPARATOR: &str = "\nUNION ALL\n";

/// The two expressions that differ between string and scalar columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindFragments {
    pub empty_string_count: String,
    pub missing_rate: String,
}

impl TypeKind {
    pub fn fragments(&self, column: &str) -> KindFragments {
        match self {
            TypeKind::StringLike => string_like_fragments(column),
            TypeKind::Scalar => scalar_fragments(column),
        }
    }
}

// Blank strings count as missing alongside NULLs.
fn string_like_fragments(column: &str) -> KindFragments {
    KindFragments {
        empty_string_count: format!("COUNTIF(TRIM({}) = '')", column),
        missing_rate: format!(
            "SAFE_DIVIDE(COUNTIF({col} IS NULL OR TRIM({col}) = ''), COUNT(*)) * 100",
            col = column
        ),
    }
}

fn scalar_fragments(column: &str) -> KindFragments {
    KindFragments {
        empty_string_count: "NULL".to_string(),
        missing_rate: format!("SAFE_DIVIDE(COUNTIF({} IS NULL), COUNT(*)) * 100", column),
    }
}

/// Renders per-column statistics SELECTs and stacks them with UNION ALL.
pub struct QueryBuilder {
    env: Environment<'static>,
}

impl QueryBuilder {
    pub fn new() -> Result<Self, InspectError> {
        let mut env = Environment::new();
        env.add_template(
            SELECT_TEMPLATE,
            include_str!("../../templates/inspection_select.sql"),
        )?;

        Ok(Self { env })
    }

    pub fn build(&self, request: &QueryRequest) -> Result<String, InspectError> {
        if request.table_reference.trim().is_empty() {
            return Err(InspectError::MissingTableReference);
        }

        let where_clause = request
            .date_filter
            .as_ref()
            .map(DateFilter::where_clause)
            .unwrap_or_default();

        let template = self.env.get_template(SELECT_TEMPLATE)?;
        let mut selects = Vec::with_capacity(request.columns.len());

        for spec in &request.columns {
            let Some(declared) = spec.usable_type() else {
                debug!(
                    "Skipping column '{}' with type '{}'",
                    spec.name, spec.declared_type
                );
                continue;
            };

            let fragments = declared.kind().fragments(&spec.name);
            let select = template.render(context! {
                column => spec.name.as_str(),
                declared_type => declared.as_str(),
                empty_string_count => fragments.empty_string_count,
                missing_rate => fragments.missing_rate,
                table_reference => request.table_reference.as_str(),
                where_clause => where_clause.as_str(),
            })?;

            selects.push(select.trim().to_string());
        }

        if selects.is_empty() {
            return Err(InspectError::EmptyColumnSet);
        }

        info!(
            "Generated inspection query for {} with {} of {} columns",
            request.table_reference,
            selects.len(),
            request.columns.len()
        );

        Ok(selects.join(UNION_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::schema::ColumnSpec;
    use chrono::NaiveDate;

    fn request(columns: Vec<ColumnSpec>, date_filter: Option<DateFilter>) -> QueryRequest {
        QueryRequest {
            table_reference: "proj.ds.tbl".to_string(),
            columns,
            date_filter,
        }
    }

    fn impression_filter() -> DateFilter {
        DateFilter {
            enabled: true,
            column: "impression_date".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        }
    }

    fn build(columns: Vec<ColumnSpec>, date_filter: Option<DateFilter>) -> String {
        QueryBuilder::new()
            .unwrap()
            .build(&request(columns, date_filter))
            .unwrap()
    }

    #[test]
    fn renders_string_column_exactly() {
        let sql = build(vec![ColumnSpec::new("user_id", "STRING")], None);
        let expected = "SELECT
'user_id' AS column_name,
NULL AS column_ronti,
'STRING_ARRAY' AS data_type,
NULL AS data_ronti,
NULL AS data_length,
NULL AS null_able,
NULL AS selection_columns,
NULL AS consideration_columns,
COUNT(*) AS total_count,
COUNTIF(user_id IS NULL) AS null_count,
COUNTIF(TRIM(user_id) = '') AS empty_string_count,
COUNT(DISTINCT user_id) AS unique_count,
SAFE_DIVIDE(COUNTIF(user_id IS NULL OR TRIM(user_id) = ''), COUNT(*)) * 100 AS missing_rate_percent,
SAFE_CAST(MIN(user_id) AS STRING) AS min_value,
SAFE_CAST(MAX(user_id) AS STRING) AS max_value
FROM `proj.ds.tbl`";
        assert_eq!(sql, expected);
    }

    #[test]
    fn scalar_column_uses_null_empty_count() {
        let sql = build(vec![ColumnSpec::new("price", "FLOAT")], None);
        assert!(sql.contains("'FLOAT_ARRAY' AS data_type"));
        assert!(sql.contains("\nNULL AS empty_string_count,\n"));
        assert!(sql.contains(
            "SAFE_DIVIDE(COUNTIF(price IS NULL), COUNT(*)) * 100 AS missing_rate_percent"
        ));
        assert!(!sql.contains("TRIM("));
    }

    #[test]
    fn every_scalar_type_renders() {
        for label in ["BOOLEAN", "INTEGER", "FLOAT", "TIMESTAMP", "DATE"] {
            let sql = build(vec![ColumnSpec::new("c", label)], None);
            assert!(sql.contains(&format!("'{}_ARRAY' AS data_type", label)));
            assert!(sql.contains("NULL AS empty_string_count"));
        }
    }

    #[test]
    fn n_columns_give_n_selects() {
        let labels = ["STRING", "BOOLEAN", "INTEGER", "FLOAT", "TIMESTAMP", "DATE"];
        for n in 1..=labels.len() {
            let columns: Vec<ColumnSpec> = labels[..n]
                .iter()
                .enumerate()
                .map(|(i, label)| ColumnSpec::new(&format!("c{}", i), label))
                .collect();
            let sql = build(columns, None);
            assert_eq!(sql.matches("SELECT\n").count(), n, "n = {}", n);
            assert_eq!(sql.matches(UNION_SEPARATOR).count(), n - 1, "n = {}", n);
            assert!(!sql.starts_with('\n'));
            assert!(!sql.ends_with('\n'));
        }
    }

    #[test]
    fn from_clause_without_filter() {
        let sql = build(vec![ColumnSpec::new("a", "STRING")], None);
        assert!(sql.ends_with("\nFROM `proj.ds.tbl`"));
    }

    #[test]
    fn from_clause_with_filter() {
        let sql = build(vec![ColumnSpec::new("a", "STRING")], Some(impression_filter()));
        assert!(sql.ends_with(
            "\nFROM `proj.ds.tbl` WHERE DATE(impression_date) BETWEEN '2025-03-01' AND '2025-03-31'"
        ));
    }

    #[test]
    fn disabled_filter_adds_nothing() {
        let mut filter = impression_filter();
        filter.enabled = false;
        let sql = build(vec![ColumnSpec::new("a", "STRING")], Some(filter));
        assert!(sql.ends_with("FROM `proj.ds.tbl`"));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn filter_applies_to_every_select() {
        let columns = vec![ColumnSpec::new("a", "STRING"), ColumnSpec::new("b", "INTEGER")];
        let sql = build(columns, Some(impression_filter()));
        assert_eq!(sql.matches("WHERE DATE(impression_date)").count(), 2);
    }

    #[test]
    fn skips_invalid_rows() {
        let columns = vec![
            ColumnSpec::new("", "STRING"),
            ColumnSpec::new("kept", "INTEGER"),
            ColumnSpec::new("unknown", "NUMERIC"),
            ColumnSpec::new("untyped", ""),
        ];
        let sql = build(columns, None);
        assert_eq!(sql.matches("SELECT\n").count(), 1);
        assert!(sql.contains("'kept' AS column_name"));
        assert!(!sql.contains("UNION ALL"));
    }

    #[test]
    fn all_empty_names_is_an_error() {
        let builder = QueryBuilder::new().unwrap();
        let result = builder.build(&request(ColumnSpec::placeholder_rows(), None));
        assert!(matches!(result, Err(InspectError::EmptyColumnSet)));
    }

    #[test]
    fn empty_column_list_is_an_error() {
        let builder = QueryBuilder::new().unwrap();
        let result = builder.build(&request(Vec::new(), None));
        assert!(matches!(result, Err(InspectError::EmptyColumnSet)));
    }

    #[test]
    fn blank_table_reference_is_an_error() {
        let builder = QueryBuilder::new().unwrap();
        let mut req = request(vec![ColumnSpec::new("a", "STRING")], None);
        req.table_reference = "  ".to_string();
        assert!(matches!(
            builder.build(&req),
            Err(InspectError::MissingTableReference)
        ));
    }

    #[test]
    fn output_is_idempotent() {
        let builder = QueryBuilder::new().unwrap();
        let req = request(
            vec![ColumnSpec::new("a", "STRING"), ColumnSpec::new("b", "TIMESTAMP")],
            Some(impression_filter()),
        );
        assert_eq!(builder.build(&req).unwrap(), builder.build(&req).unwrap());
    }

    #[test]
    fn duplicate_names_keep_input_order() {
        let columns = vec![
            ColumnSpec::new("x", "STRING"),
            ColumnSpec::new("y", "DATE"),
            ColumnSpec::new("x", "INTEGER"),
        ];
        let sql = build(columns, None);
        let blocks: Vec<&str> = sql.split(UNION_SEPARATOR).collect();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].contains("'x' AS column_name") && blocks[0].contains("'STRING_ARRAY'"));
        assert!(blocks[1].contains("'y' AS column_name"));
        assert!(blocks[2].contains("'x' AS column_name") && blocks[2].contains("'INTEGER_ARRAY'"));
    }

    #[test]
    fn fragments_follow_kind() {
        let string = TypeKind::StringLike.fragments("name");
        assert_eq!(string.empty_string_count, "COUNTIF(TRIM(name) = '')");

        let scalar = TypeKind::Scalar.fragments("name");
        assert_eq!(scalar.empty_string_count, "NULL");
        assert_eq!(
            scalar.missing_rate,
            "SAFE_DIVIDE(COUNTIF(name IS NULL), COUNT(*)) * 100"
        );
    }
}

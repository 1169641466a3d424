use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{AppConfig, GenerateArgs};
use crate::inspect::builder::QueryBuilder;
use crate::inspect::parser::parse_tsv;
use crate::inspect::schema::{DateFilter, QueryRequest};
use crate::inspect::InspectError;

/// Turns `generate` arguments plus the TSV text into a query request.
pub fn request_from_args(
    args: &GenerateArgs,
    config: &AppConfig,
    raw_tsv: &str,
) -> Result<QueryRequest, InspectError> {
    let columns = parse_tsv(raw_tsv);
    if columns.is_empty() {
        return Err(InspectError::InvalidPaste);
    }

    let date_filter = if args.date_filter {
        let defaults = &config.generator;
        let filter = DateFilter {
            enabled: true,
            column: args
                .date_column
                .clone()
                .unwrap_or_else(|| defaults.default_term_column.clone()),
            start: args.start.unwrap_or(defaults.default_start),
            end: args.end.unwrap_or(defaults.default_end),
        };
        if filter.is_inverted() {
            warn!(
                "Date filter start {} is after end {}; the query will match no rows",
                filter.start, filter.end
            );
        }
        Some(filter)
    } else {
        None
    };

    Ok(QueryRequest {
        table_reference: args.table.clone(),
        columns,
        date_filter,
    })
}

/// Where the generated query should be written, if not stdout.
fn output_path(args: &GenerateArgs, config: &AppConfig) -> Option<PathBuf> {
    if let Some(path) = &args.output {
        Some(path.clone())
    } else if args.save {
        Some(PathBuf::from(&config.generator.output_file))
    } else {
        None
    }
}

pub fn run_generate(args: &GenerateArgs, config: &AppConfig) -> Result<(), InspectError> {
    let raw_tsv = match &args.input {
        Some(path) => {
            info!("Reading column specs from {}", path.display());
            std::fs::read_to_string(path)?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let request = request_from_args(args, config, &raw_tsv)?;
    let query = QueryBuilder::new()?.build(&request)?;

    match output_path(args, config) {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", query))?;
            info!("Wrote inspection query to {}", path.display());
        }
        None => println!("{}", query),
    }

    Ok(())
}

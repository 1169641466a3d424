use csv::ReaderBuilder;
use tracing::debug;

use crate::inspect::schema::ColumnSpec;

/// Parses pasted spreadsheet rows (`name<TAB>type`, one per line) into
/// column specs, in input order.
///
/// Only lines with exactly two tab-separated fields are kept. Lines with no
/// tab or with extra tabs are dropped; empty names and unknown types are kept
/// and left for the query builder to skip.
pub fn parse_tsv(raw_text: &str) -> Vec<ColumnSpec> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(raw_text.as_bytes());

    let mut specs = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable TSV line: {}", e);
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.len() != 2 {
            debug!(
                "Skipping TSV line {}: expected 2 tab-separated fields, found {}",
                line,
                record.len()
            );
            continue;
        }

        specs.push(ColumnSpec::new(&record[0], &record[1]));
    }

    debug!("Parsed {} column specs from TSV input", specs.len());
    specs
}

//! # CSV Format
//!
//! RFC 4180 rendering of a [`ResultsTable`]: CRLF line endings, a fixed
//! header row, and fields quoted when they contain a comma, a double quote
//! or a line break. Every row repeats the project name and TRL so a single
//! row is meaningful on its own (spreadsheet filters, `grep`).
//!
//! Parsing is the exact inverse and re-validates every cell.

use crate::export::{ResultRow, ResultsTable, RowKind};
use crate::score::Score;
use crate::types::{Category, EssaError, FactorName, StageName, TrlLevel};

/// Column names, in order.
pub const HEADER: [&str; 12] = [
    "project", "trl", "kind", "stage", "category", "factor", "score", "sum", "count", "average",
    "label", "note",
];

const LINE_END: &str = "\r\n";

// =============================================================================
// WRITER
// =============================================================================

/// Render a table as CSV.
#[must_use]
pub fn to_csv(table: &ResultsTable) -> String {
    let mut out = String::new();
    push_record(&mut out, HEADER.iter().map(|h| (*h).to_string()));

    let trl = table.trl.map(|t| t.value().to_string()).unwrap_or_default();
    for row in &table.rows {
        push_record(
            &mut out,
            [
                table.project.clone(),
                trl.clone(),
                row.kind.as_str().to_string(),
                opt(row.stage.as_ref()),
                opt(row.category.as_ref()),
                opt(row.factor.as_ref()),
                opt(row.score.as_ref()),
                opt(row.sum.as_ref()),
                opt(row.count.as_ref()),
                row.average.clone().unwrap_or_default(),
                row.label.clone(),
                row.note.clone(),
            ],
        );
    }
    out
}

fn opt<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

fn push_record<I>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = String>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, &field);
    }
    out.push_str(LINE_END);
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

// =============================================================================
// PARSER
// =============================================================================

/// Split CSV text into records of fields.
///
/// Accepts CRLF or bare LF line endings. A trailing line break does not
/// start an empty record.
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>, EssaError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
            }
            '"' => {
                return Err(EssaError::DeserializationError(format!(
                    "CSV line {}: stray quote inside unquoted field",
                    line
                )));
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                field_started = false;
                line += 1;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(EssaError::DeserializationError(
            "CSV ends inside a quoted field".to_string(),
        ));
    }
    if field_started || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

/// Parse a table rendered by [`to_csv`].
pub fn from_csv(text: &str) -> Result<ResultsTable, EssaError> {
    let mut records = parse_records(text)?.into_iter().enumerate();

    match records.next() {
        Some((_, header)) if header.iter().map(String::as_str).eq(HEADER) => {}
        _ => {
            return Err(EssaError::DeserializationError(
                "CSV header does not match the results table columns".to_string(),
            ));
        }
    }

    let mut identity: Option<(String, String)> = None;
    let mut rows = Vec::new();
    for (index, record) in records {
        let line = index + 1;
        if record.len() != HEADER.len() {
            return Err(cell_error(
                line,
                format!("expected {} fields, got {}", HEADER.len(), record.len()),
            ));
        }
        let key = (record[0].clone(), record[1].clone());
        match &identity {
            None => identity = Some(key),
            Some(first) if *first != key => {
                return Err(cell_error(line, "project or TRL differs from the first row".into()));
            }
            Some(_) => {}
        }
        let row = parse_row(&record).map_err(|e| cell_error(line, e.to_string()))?;
        row.validate().map_err(|e| cell_error(line, e.to_string()))?;
        rows.push(row);
    }

    let (project, trl) = identity.ok_or_else(|| {
        EssaError::DeserializationError("CSV contains no result rows".to_string())
    })?;
    let trl = if trl.is_empty() {
        None
    } else {
        Some(TrlLevel::new(parse_number(&trl)?)?)
    };

    Ok(ResultsTable { project, trl, rows })
}

fn parse_row(record: &[String]) -> Result<ResultRow, EssaError> {
    Ok(ResultRow {
        kind: RowKind::parse(&record[2])?,
        stage: non_empty(&record[3]).map(StageName::new).transpose()?,
        category: non_empty(&record[4])
            .map(str::parse::<Category>)
            .transpose()?,
        factor: non_empty(&record[5]).map(FactorName::new).transpose()?,
        score: non_empty(&record[6])
            .map(|s| parse_number(s).and_then(Score::new))
            .transpose()?,
        sum: non_empty(&record[7]).map(parse_number).transpose()?,
        count: non_empty(&record[8]).map(parse_number).transpose()?,
        average: non_empty(&record[9]).map(str::to_string),
        label: record[10].clone(),
        note: record[11].clone(),
    })
}

fn non_empty(cell: &str) -> Option<&str> {
    (!cell.is_empty()).then_some(cell)
}

fn parse_number<T: std::str::FromStr>(cell: &str) -> Result<T, EssaError> {
    cell.parse()
        .map_err(|_| EssaError::DeserializationError(format!("Not a number: {}", cell)))
}

fn cell_error(line: usize, reason: String) -> EssaError {
    EssaError::DeserializationError(format!("CSV record {}: {}", line, reason))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_follows_rfc4180() {
        let mut out = String::new();
        push_field(&mut out, r#"says "hi", twice"#);
        assert_eq!(out, r#""says ""hi"", twice""#);

        let records = parse_records("a,\"b,c\",\"d\"\"e\"\r\n\"multi\nline\",,x\r\n").expect("valid");
        assert_eq!(
            records,
            vec![
                vec!["a".to_string(), "b,c".into(), "d\"e".into()],
                vec!["multi\nline".to_string(), String::new(), "x".into()],
            ]
        );
    }

    #[test]
    fn bare_lf_and_missing_final_newline_accepted() {
        let records = parse_records("a,b\nc,d").expect("valid");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], vec!["c".to_string(), "d".into()]);
    }

    #[test]
    fn unterminated_quote_rejected() {
        assert!(parse_records("a,\"b\r\n").is_err());
        assert!(parse_records("a,b\"c\r\n").is_err());
    }

    #[test]
    fn wrong_header_rejected() {
        assert!(from_csv("name,score\r\nx,1\r\n").is_err());
    }

    #[test]
    fn header_only_rejected() {
        let text = format!("{}\r\n", HEADER.join(","));
        assert!(from_csv(&text).is_err());
    }

    #[test]
    fn single_entry_row_parses() {
        let text = format!(
            "{}\r\nDemo,3,entry,Use,Environmental,\"Resource use, fossils\",2,,,,Better,\"less, not more\"\r\n",
            HEADER.join(",")
        );
        let table = from_csv(&text).expect("valid");

        assert_eq!(table.project, "Demo");
        assert_eq!(table.trl.map(TrlLevel::value), Some(3));
        let row = &table.rows[0];
        assert_eq!(row.factor.as_ref().map(FactorName::as_str), Some("Resource use, fossils"));
        assert_eq!(row.note, "less, not more");
    }

    #[test]
    fn inconsistent_label_rejected() {
        let text = format!(
            "{}\r\nDemo,,entry,Use,Environmental,Water use,2,,,,Worse,\r\n",
            HEADER.join(",")
        );
        assert!(from_csv(&text).is_err());
    }
}

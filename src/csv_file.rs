use std::io::{BufRead, Read, Write};

use crate::error::{PipelineError, Result};
use crate::record::{MergedRecord, SimScore};

// Intermediate table: qid, query_text, doc_id, sim. Minimal quoting: a
// field is quoted only when it contains a comma, quote, CR or LF, and
// embedded quotes double.

fn write_field(out: &mut impl Write, field: &str) -> std::io::Result<()> {
    if field.contains([',', '"', '\n', '\r']) {
        out.write_all(b"\"")?;
        out.write_all(field.replace('"', "\"\"").as_bytes())?;
        out.write_all(b"\"")
    } else {
        out.write_all(field.as_bytes())
    }
}

/// Write merged records as four-column CSV.
pub fn write_records(mut writer: impl Write, records: &[MergedRecord]) -> Result<()> {
    for rec in records {
        write_field(&mut writer, &rec.qid)?;
        writer.write_all(b",")?;
        write_field(&mut writer, &rec.query_id)?;
        writer.write_all(b",")?;
        write_field(&mut writer, &rec.doc_id)?;
        writer.write_all(b",")?;
        write_field(&mut writer, rec.sim.as_str())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a four-column CSV back into merged records.
///
/// Wrong column count or an unparsable sim column is fatal.
pub fn read_records(mut reader: impl BufRead) -> Result<Vec<MergedRecord>> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    let mut records = Vec::new();
    for (idx, row) in parse_rows(&input).into_iter().enumerate() {
        let [qid, query_id, doc_id, sim] = match <[String; 4]>::try_from(row) {
            Ok(cols) => cols,
            Err(row) => {
                return Err(PipelineError::MalformedLine {
                    line: idx + 1,
                    expected: 4,
                    found: row.len(),
                })
            }
        };
        let sim = SimScore::parse(&sim, idx + 1)?;
        records.push(MergedRecord {
            qid,
            query_id,
            doc_id,
            sim,
        });
    }
    Ok(records)
}

// Small state machine; a quoted field may span record separators.
fn parse_rows(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    // input without a trailing newline still yields its last row
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

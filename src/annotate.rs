use std::io::{BufRead, Write};

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::score_table::QueryScoreTable;

/// Rewrite one feature line, inserting the joined score as feature `4:`.
///
/// The line splits at the first `#` into a metadata segment and a comment
/// segment. The comment's first two tokens are the raw query id and the doc
/// id; the query id gets `namespace` prepended before the table lookup.
/// Both segments are emitted byte-for-byte, with `4:<score>` and the
/// ` \t # \t ` separator between them.
pub fn annotate_line(
    line: &str,
    line_no: usize,
    table: &QueryScoreTable,
    namespace: &str,
) -> Result<String> {
    let (meta, comment) = line
        .split_once('#')
        .ok_or(PipelineError::MissingComment { line: line_no })?;

    let mut tokens = comment.split_whitespace();
    let found = |n| PipelineError::MalformedLine {
        line: line_no,
        expected: 2,
        found: n,
    };
    let raw_query = tokens.next().ok_or_else(|| found(0))?;
    let doc_id = tokens.next().ok_or_else(|| found(1))?;

    let query_id = format!("{namespace}{raw_query}");
    let sim = table.get(&query_id, doc_id);

    Ok(format!("{meta}4:{sim} \t # \t {comment}"))
}

/// Annotate every line of `reader` into `writer`, 1:1.
pub fn annotate(
    reader: impl BufRead,
    mut writer: impl Write,
    table: &QueryScoreTable,
    namespace: &str,
) -> Result<usize> {
    let mut count = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let annotated = annotate_line(&line, idx + 1, table, namespace)?;
        writeln!(writer, "{annotated}")?;
        count += 1;
    }
    writer.flush()?;
    info!(lines = count, "annotated feature file");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table(input: &str) -> QueryScoreTable {
        QueryScoreTable::from_reader(Cursor::new(input)).unwrap()
    }

    #[test]
    fn inserts_joined_score() {
        let t = table("enwiki:Q1 _ D1 _ 0.5\nenwiki:Q1 _ D2 _ 0.9\n");
        let out = annotate_line("0 qid:1 1:0.2 2:0.1 3:0.4 # Q1 D1", 1, &t, "enwiki:").unwrap();
        assert_eq!(out, "0 qid:1 1:0.2 2:0.1 3:0.4 4:0.5 \t # \t  Q1 D1");
    }

    #[test]
    fn missing_pair_defaults_to_zero() {
        let t = table("enwiki:Q1 _ D1 _ 0.5\n");
        let out = annotate_line("0 qid:1 1:0.2 # Q1 D7", 1, &t, "enwiki:").unwrap();
        assert!(out.contains("4:0.0"));
    }

    #[test]
    fn segments_survive_byte_for_byte() {
        let t = table("enwiki:Q1 _ D1 _ 0.5\n");
        let meta = "2 qid:9  1:0.001   3:7 ";
        let comment = "  Q1   D1  trailing words";
        let out = annotate_line(&format!("{meta}#{comment}"), 1, &t, "enwiki:").unwrap();
        assert!(out.starts_with(meta));
        assert!(out.ends_with(comment));
    }

    #[test]
    fn line_without_comment_is_fatal() {
        let t = QueryScoreTable::default();
        let err = annotate_line("0 qid:1 1:0.2", 3, &t, "enwiki:").unwrap_err();
        assert!(matches!(err, PipelineError::MissingComment { line: 3 }));
    }

    #[test]
    fn comment_with_one_token_is_fatal() {
        let t = QueryScoreTable::default();
        let err = annotate_line("0 qid:1 # Q1", 1, &t, "enwiki:").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedLine {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn output_count_matches_input_count() {
        let t = table("enwiki:Q1 _ D1 _ 0.5\n");
        let input = "0 qid:1 1:0.2 # Q1 D1\n1 qid:1 1:0.3 # Q1 D2\n0 qid:2 1:0.1 # Q2 D3\n";
        let mut out = Vec::new();
        let n = annotate(Cursor::new(input), &mut out, &t, "enwiki:").unwrap();
        assert_eq!(n, 3);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}

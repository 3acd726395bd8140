use std::io;
use thiserror::Error;

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Everything that can abort a batch run.
///
/// None of these are caught anywhere; they propagate to `main` and kill the
/// run. The single recoverable condition in the whole pipeline is a missing
/// (query, doc) pair during annotation, which is not an error at all: it
/// defaults to a score of `0.0` in [`crate::score_table::QueryScoreTable::get`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    MalformedLine {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: no '#' comment separator")]
    MissingComment { line: usize },

    #[error("line {line}: field 1 '{text}' is not of the form qid:<n>")]
    BadQidField { line: usize, text: String },

    #[error("line {line}: unparsable score '{text}'")]
    UnparsableScore { line: usize, text: String },

    #[error("line {line}: unparsable rank '{text}'")]
    UnparsableRank { line: usize, text: String },

    /// Rank index from the score file points past the records seen for that
    /// query in the run file. The two inputs do not describe the same run.
    #[error("query {query_id}: rank {rank} out of range ({len} records recorded)")]
    RankOutOfRange {
        query_id: String,
        rank: usize,
        len: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_line_display() {
        let err = PipelineError::MalformedLine {
            line: 3,
            expected: 5,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("5"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn rank_out_of_range_display() {
        let err = PipelineError::RankOutOfRange {
            query_id: "7".to_string(),
            rank: 12,
            len: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("query 7"));
        assert!(msg.contains("rank 12"));
    }
}

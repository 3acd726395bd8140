use std::collections::HashMap;
use std::io::BufRead;

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::record::SimScore;

/// Similarity scores keyed by query id, then doc id.
///
/// Built once from a run-format score file and read-only afterwards.
/// Duplicate (query, doc) pairs are not an error: the last line wins.
#[derive(Debug, Default)]
pub struct QueryScoreTable {
    scores: HashMap<String, HashMap<String, SimScore>>,
}

impl QueryScoreTable {
    /// Load a table from lines of `query_id _ doc_id _ score ...`.
    ///
    /// Field 0 is the query id, field 2 the doc id, field 4 the score.
    /// Lines with fewer than five fields are fatal.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut scores: HashMap<String, HashMap<String, SimScore>> = HashMap::new();
        let mut lines_read = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return Err(PipelineError::MalformedLine {
                    line: idx + 1,
                    expected: 5,
                    found: fields.len(),
                });
            }
            let sim = SimScore::parse(fields[4], idx + 1)?;
            scores
                .entry(fields[0].to_string())
                .or_default()
                .insert(fields[2].to_string(), sim);
            lines_read += 1;
        }
        debug!(lines = lines_read, queries = scores.len(), "score table loaded");
        Ok(QueryScoreTable { scores })
    }

    /// Score for a (query, doc) pair, `0.0` when the pair is absent.
    pub fn get(&self, query_id: &str, doc_id: &str) -> SimScore {
        self.scores
            .get(query_id)
            .and_then(|docs| docs.get(doc_id))
            .cloned()
            .unwrap_or_else(SimScore::zero)
    }

    pub fn query_count(&self) -> usize {
        self.scores.len()
    }
}

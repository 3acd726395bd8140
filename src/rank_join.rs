use std::collections::HashMap;
use std::io::BufRead;

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::record::{MergedRecord, SimScore};

/// Per-query document order recorded from a pass over a ranklib run file.
///
/// Position in a query's list is its 0-based rank. Resolving `(qid, rank)`
/// against this order assumes the score file enumerates documents in the
/// same order the run file did; nothing can check that here, and the only
/// enforced consistency is the list-length bound.
#[derive(Debug, Default)]
pub struct RunOrder {
    order: HashMap<String, Vec<(String, String)>>,
}

/// Accumulator for building a [`RunOrder`] line by line.
///
/// A new block starts whenever the qid *value changes* from the previous
/// line; a key seen again later starts over with an empty list.
#[derive(Debug, Default)]
struct OrderBuilder {
    order: HashMap<String, Vec<(String, String)>>,
    last_qid: Option<String>,
}

impl OrderBuilder {
    fn push(&mut self, qid: &str, query_id: &str, doc_id: &str) {
        if self.last_qid.as_deref() != Some(qid) {
            self.order.insert(qid.to_string(), Vec::new());
            self.last_qid = Some(qid.to_string());
        }
        self.order
            .entry(qid.to_string())
            .or_default()
            .push((query_id.to_string(), doc_id.to_string()));
    }

    fn finish(self) -> RunOrder {
        RunOrder { order: self.order }
    }
}

impl RunOrder {
    /// Record document order from ranklib lines.
    ///
    /// Field 1 is `qid:<n>` (the block key is the part after the colon);
    /// fields 6 and 7, the two tokens following the `#` marker, are the
    /// canonical query and doc ids.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut builder = OrderBuilder::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 8 {
                return Err(PipelineError::MalformedLine {
                    line: idx + 1,
                    expected: 8,
                    found: fields.len(),
                });
            }
            let qid = fields[1]
                .strip_prefix("qid:")
                .ok_or_else(|| PipelineError::BadQidField {
                    line: idx + 1,
                    text: fields[1].to_string(),
                })?;
            builder.push(qid, fields[6], fields[7]);
        }
        let order = builder.finish();
        debug!(queries = order.order.len(), "run order recorded");
        Ok(order)
    }

    /// The (query_id, doc_id) at `rank` within `qid`'s block.
    pub fn resolve(&self, qid: &str, rank: usize) -> Result<&(String, String)> {
        let block = self
            .order
            .get(qid)
            .ok_or_else(|| PipelineError::RankOutOfRange {
                query_id: qid.to_string(),
                rank,
                len: 0,
            })?;
        block.get(rank).ok_or_else(|| PipelineError::RankOutOfRange {
            query_id: qid.to_string(),
            rank,
            len: block.len(),
        })
    }

    pub fn query_count(&self) -> usize {
        self.order.len()
    }
}

/// Join a rank-indexed score file against recorded run order.
///
/// Score lines carry `qid rank sim`; each resolves through `order` into a
/// full [`MergedRecord`]. A rank past the end of a block aborts the run.
pub fn join_by_rank(reader: impl BufRead, order: &RunOrder) -> Result<Vec<MergedRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(PipelineError::MalformedLine {
                line: idx + 1,
                expected: 3,
                found: fields.len(),
            });
        }
        let rank: usize = fields[1]
            .parse()
            .map_err(|_| PipelineError::UnparsableRank {
                line: idx + 1,
                text: fields[1].to_string(),
            })?;
        let sim = SimScore::parse(fields[2], idx + 1)?;
        let (query_id, doc_id) = order.resolve(fields[0], rank)?;
        records.push(MergedRecord {
            qid: fields[0].to_string(),
            query_id: query_id.clone(),
            doc_id: doc_id.clone(),
            sim,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const RUN: &str = "\
0 qid:1 1:0.2 2:0.1 3:0.4 # Q1 Da
1 qid:1 1:0.3 2:0.2 3:0.1 # Q1 Db
0 qid:2 1:0.1 2:0.5 3:0.2 # Q2 Dc
";

    #[test]
    fn records_per_query_order() {
        let order = RunOrder::from_reader(Cursor::new(RUN)).unwrap();
        assert_eq!(order.query_count(), 2);
        assert_eq!(
            order.resolve("1", 0).unwrap(),
            &("Q1".to_string(), "Da".to_string())
        );
        assert_eq!(
            order.resolve("1", 1).unwrap(),
            &("Q1".to_string(), "Db".to_string())
        );
        assert_eq!(
            order.resolve("2", 0).unwrap(),
            &("Q2".to_string(), "Dc".to_string())
        );
    }

    #[test]
    fn rank_resets_on_value_change_not_contiguity() {
        // qid 1 reappears after qid 2: its block starts over
        let run = "\
0 qid:1 1:0.2 2:0.1 3:0.4 # Q1 Da
0 qid:2 1:0.1 2:0.5 3:0.2 # Q2 Dc
0 qid:1 1:0.6 2:0.2 3:0.3 # Q1 Dz
";
        let order = RunOrder::from_reader(Cursor::new(run)).unwrap();
        assert_eq!(
            order.resolve("1", 0).unwrap(),
            &("Q1".to_string(), "Dz".to_string())
        );
        assert!(order.resolve("1", 1).is_err());
    }

    #[test]
    fn rank_past_block_end_is_fatal() {
        let order = RunOrder::from_reader(Cursor::new(RUN)).unwrap();
        let err = order.resolve("2", 1).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RankOutOfRange { rank: 1, len: 1, .. }
        ));
    }

    #[test]
    fn unknown_query_is_fatal() {
        let order = RunOrder::from_reader(Cursor::new(RUN)).unwrap();
        assert!(order.resolve("9", 0).is_err());
    }

    #[test]
    fn bad_qid_field_is_fatal() {
        let run = "0 1 1:0.2 2:0.1 3:0.4 5:0 # Q1 Da\n";
        let err = RunOrder::from_reader(Cursor::new(run)).unwrap_err();
        assert!(matches!(err, PipelineError::BadQidField { line: 1, .. }));
    }

    #[test]
    fn join_resolves_rank_to_doc() {
        let order = RunOrder::from_reader(Cursor::new(RUN)).unwrap();
        let records = join_by_rank(Cursor::new("1 1 0.77\n"), &order).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].qid, "1");
        assert_eq!(records[0].query_id, "Q1");
        assert_eq!(records[0].doc_id, "Db");
        assert_eq!(records[0].sim.as_str(), "0.77");
    }

    #[test]
    fn join_bad_rank_is_fatal() {
        let order = RunOrder::from_reader(Cursor::new(RUN)).unwrap();
        let err = join_by_rank(Cursor::new("1 x 0.77\n"), &order).unwrap_err();
        assert!(matches!(err, PipelineError::UnparsableRank { line: 1, .. }));
    }

    #[test]
    fn join_overrun_is_fatal() {
        let order = RunOrder::from_reader(Cursor::new(RUN)).unwrap();
        let err = join_by_rank(Cursor::new("1 5 0.77\n"), &order).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RankOutOfRange { rank: 5, len: 2, .. }
        ));
    }
}

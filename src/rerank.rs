use std::io::Write;

use tracing::info;

use crate::error::Result;
use crate::record::MergedRecord;

/// Order records by `(qid, sim)`: query id ascending, then score text
/// ascending. Rank within a query therefore follows the string order of the
/// score text; callers wanting best-first supply pre-negated scores.
pub fn sort_records(records: &mut [MergedRecord]) {
    records.sort_by(|a, b| {
        a.qid
            .cmp(&b.qid)
            .then_with(|| a.sim.as_str().cmp(b.sim.as_str()))
    });
}

/// Rank numbering that restarts at 1 whenever the query id changes.
#[derive(Debug, Default)]
pub struct RankCounter {
    last_qid: Option<String>,
    next: u32,
}

impl RankCounter {
    pub fn assign(&mut self, qid: &str) -> u32 {
        if self.last_qid.as_deref() != Some(qid) {
            self.last_qid = Some(qid.to_string());
            self.next = 1;
        }
        let rank = self.next;
        self.next += 1;
        rank
    }
}

/// Write sorted records as a TREC run:
/// `<namespace><query_id>\tQ0\t<doc_id>\t<rank>\t<score>\t<run_tag>`.
///
/// Records must already be grouped by qid (see [`sort_records`]); ranks are
/// renumbered from 1 within each group.
pub fn write_run(
    mut writer: impl Write,
    records: &[MergedRecord],
    namespace: &str,
    run_tag: &str,
) -> Result<()> {
    let mut counter = RankCounter::default();
    for rec in records {
        let rank = counter.assign(&rec.qid);
        writeln!(
            writer,
            "{namespace}{query}\tQ0\t{doc}\t{rank}\t{sim}\t{run_tag}",
            query = rec.query_id,
            doc = rec.doc_id,
            sim = rec.sim,
        )?;
    }
    writer.flush()?;
    info!(records = records.len(), run_tag, "run file written");
    Ok(())
}

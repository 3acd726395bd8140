use std::io::Write;

use serde::Serialize;
use tracing::info;

use crate::car::Page;
use crate::error::Result;

/// Query operator wrapped around the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    /// `#combine(...)`
    Combine,
    /// `#rm(...)`, the pseudo-relevance-feedback operator.
    RelevanceModel,
}

impl QueryOperator {
    fn wrap(self, text: &str) -> String {
        match self {
            QueryOperator::Combine => format!("#combine({text})"),
            QueryOperator::RelevanceModel => format!("#rm({text})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub number: String,
    pub text: String,
}

/// Query file for the plain ranked-retrieval run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFile {
    pub index: String,
    pub requested: u64,
    pub processing_model: String,
    pub scorer: String,
    pub queries: Vec<Query>,
}

/// Query file variant for the pseudo-relevance-feedback run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQueryFile {
    pub index: String,
    pub requested: u64,
    pub relevance_model: u32,
    pub fb_docs: u64,
    pub fb_term: u64,
    pub fb_orig_weight: f64,
    pub queries: Vec<Query>,
}

/// Queries for one page: the page itself, then one query per root-to-leaf
/// heading path.
///
/// Heading-path queries get `number` = page id and heading ids joined by
/// `/`, and `text` = page name and heading texts joined by spaces.
pub fn page_queries(page: &Page, op: QueryOperator) -> Vec<Query> {
    let mut queries = vec![Query {
        number: page.page_id.clone(),
        text: op.wrap(&page.page_name),
    }];
    for path in page.flat_heading_paths() {
        let ids: Vec<&str> = path.iter().map(|s| s.heading_id.as_str()).collect();
        let texts: Vec<&str> = path.iter().map(|s| s.heading.as_str()).collect();
        queries.push(Query {
            number: format!("{}/{}", page.page_id, ids.join("/")),
            text: op.wrap(&format!("{} {}", page.page_name, texts.join(" "))),
        });
    }
    queries
}

/// Collect queries for a whole page stream.
pub fn collect_queries(
    pages: impl Iterator<Item = Result<Page>>,
    op: QueryOperator,
) -> Result<Vec<Query>> {
    let mut queries = Vec::new();
    let mut page_count = 0usize;
    for page in pages {
        queries.extend(page_queries(&page?, op));
        page_count += 1;
    }
    info!(pages = page_count, queries = queries.len(), "queries assembled");
    Ok(queries)
}

pub fn write_query_file(mut writer: impl Write, file: &QueryFile) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, file)?;
    writer.flush()?;
    Ok(())
}

pub fn write_feedback_query_file(mut writer: impl Write, file: &FeedbackQueryFile) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, file)?;
    writer.flush()?;
    Ok(())
}

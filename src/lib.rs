//! Batch tools around a TREC-CAR retrieval experiment: joining similarity
//! scores into ranking files, reranking merged result lists, converting the
//! paragraph corpus to flat indexable text, and generating query files for
//! the search engine.
//!
//! Every stage is a one-shot sequential pass over local files; errors abort
//! the whole run with no partial-output guarantee.

pub mod annotate;
pub mod car;
pub mod corpus_text;
pub mod csv_file;
pub mod error;
pub mod queries;
pub mod rank_join;
pub mod record;
pub mod rerank;
pub mod score_table;

pub use error::{PipelineError, Result};
pub use record::{MergedRecord, SimScore};

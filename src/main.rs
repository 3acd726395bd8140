use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use car_pipeline::corpus_text::{self, CorpusWriter, DOCS_PER_FILE};
use car_pipeline::queries::{self, FeedbackQueryFile, QueryFile, QueryOperator};
use car_pipeline::rank_join::{join_by_rank, RunOrder};
use car_pipeline::score_table::QueryScoreTable;
use car_pipeline::{annotate, car, csv_file, rerank};

#[derive(Parser)]
#[command(name = "car_pipeline")]
#[command(about = "Score joining, reranking and corpus conversion for TREC-CAR runs", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge secondary scores into a ranklib feature file as feature 4
    Annotate {
        /// Ranklib feature file to annotate
        #[arg(long)]
        run: PathBuf,
        /// Run-format file supplying the secondary scores
        #[arg(long)]
        scores: PathBuf,
        /// Annotated output file
        #[arg(short, long)]
        output: PathBuf,
        /// Prefix turning raw comment query ids into canonical ones
        #[arg(long, default_value = "enwiki:")]
        namespace: String,
    },
    /// Join rank-indexed scores against a ranklib run and emit a TREC run
    Rerank {
        /// Ranklib file recording per-query document order
        #[arg(long)]
        run: PathBuf,
        /// Score file of `qid rank sim` lines
        #[arg(long)]
        scores: PathBuf,
        /// TREC run output file
        #[arg(short, long)]
        output: PathBuf,
        /// Also write the merged records as a CSV intermediate
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long, default_value = "enwiki:")]
        namespace: String,
        #[arg(long, default_value = "ranklib")]
        run_tag: String,
    },
    /// Convert a paragraph stream to flat trectext corpus files
    Corpus {
        /// Paragraph stream, one JSON object per line
        #[arg(long)]
        paragraphs: PathBuf,
        /// Directory receiving the numbered corpus files
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long, default_value = "paragraph_corpus")]
        stem: String,
        #[arg(long, default_value_t = DOCS_PER_FILE)]
        docs_per_file: usize,
    },
    /// Generate a query JSON file from a page outline stream
    Queries {
        /// Page stream, one JSON object per line
        #[arg(long)]
        pages: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Index path handed to the search engine
        #[arg(long)]
        index: String,
        #[arg(long, default_value_t = 100)]
        requested: u64,
        #[arg(long, default_value = "rankeddocument")]
        processing_model: String,
        #[arg(long, default_value = "bm25")]
        scorer: String,
        /// Emit the pseudo-relevance-feedback variant
        #[arg(long, default_value_t = false)]
        feedback: bool,
        #[arg(long, default_value_t = 1)]
        relevance_model: u32,
        #[arg(long, default_value_t = 10)]
        fb_docs: u64,
        #[arg(long, default_value_t = 5)]
        fb_term: u64,
        #[arg(long, default_value_t = 0.5)]
        fb_orig_weight: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt().init();
    }

    match cli.command {
        Command::Annotate {
            run,
            scores,
            output,
            namespace,
        } => run_annotate(run, scores, output, &namespace),
        Command::Rerank {
            run,
            scores,
            output,
            csv,
            namespace,
            run_tag,
        } => run_rerank(run, scores, output, csv, &namespace, &run_tag),
        Command::Corpus {
            paragraphs,
            output_dir,
            stem,
            docs_per_file,
        } => run_corpus(paragraphs, output_dir, &stem, docs_per_file),
        Command::Queries {
            pages,
            output,
            index,
            requested,
            processing_model,
            scorer,
            feedback,
            relevance_model,
            fb_docs,
            fb_term,
            fb_orig_weight,
        } => run_queries(QueriesArgs {
            pages,
            output,
            index,
            requested,
            processing_model,
            scorer,
            feedback,
            relevance_model,
            fb_docs,
            fb_term,
            fb_orig_weight,
        }),
    }
}

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

fn run_annotate(
    run: PathBuf,
    scores: PathBuf,
    output: PathBuf,
    namespace: &str,
) -> anyhow::Result<()> {
    let table = QueryScoreTable::from_reader(open(&scores)?)?;
    info!(queries = table.query_count(), "score table ready");
    annotate::annotate(open(&run)?, create(&output)?, &table, namespace)?;
    Ok(())
}

fn run_rerank(
    run: PathBuf,
    scores: PathBuf,
    output: PathBuf,
    csv: Option<PathBuf>,
    namespace: &str,
    run_tag: &str,
) -> anyhow::Result<()> {
    let order = RunOrder::from_reader(open(&run)?)?;
    info!(queries = order.query_count(), "run order ready");
    let mut records = join_by_rank(open(&scores)?, &order)?;
    if let Some(csv_path) = csv {
        csv_file::write_records(create(&csv_path)?, &records)?;
        info!(path = %csv_path.display(), "csv intermediate written");
    }
    rerank::sort_records(&mut records);
    rerank::write_run(create(&output)?, &records, namespace, run_tag)?;
    Ok(())
}

fn run_corpus(
    paragraphs: PathBuf,
    output_dir: PathBuf,
    stem: &str,
    docs_per_file: usize,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(&output_dir)?;
    let mut writer = CorpusWriter::create(&output_dir, stem, docs_per_file)?;
    let stream = car::read_paragraphs(open(&paragraphs)?);
    let count = corpus_text::write_corpus(stream, &mut writer)?;
    writer.finish()?;
    info!(paragraphs = count, "corpus converted");
    Ok(())
}

struct QueriesArgs {
    pages: PathBuf,
    output: PathBuf,
    index: String,
    requested: u64,
    processing_model: String,
    scorer: String,
    feedback: bool,
    relevance_model: u32,
    fb_docs: u64,
    fb_term: u64,
    fb_orig_weight: f64,
}

fn run_queries(args: QueriesArgs) -> anyhow::Result<()> {
    let pages = car::read_pages(open(&args.pages)?);
    let writer = create(&args.output)?;
    if args.feedback {
        let file = FeedbackQueryFile {
            index: args.index,
            requested: args.requested,
            relevance_model: args.relevance_model,
            fb_docs: args.fb_docs,
            fb_term: args.fb_term,
            fb_orig_weight: args.fb_orig_weight,
            queries: queries::collect_queries(pages, QueryOperator::RelevanceModel)?,
        };
        queries::write_feedback_query_file(writer, &file)?;
    } else {
        let file = QueryFile {
            index: args.index,
            requested: args.requested,
            processing_model: args.processing_model,
            scorer: args.scorer,
            queries: queries::collect_queries(pages, QueryOperator::Combine)?,
        };
        queries::write_query_file(writer, &file)?;
    }
    Ok(())
}

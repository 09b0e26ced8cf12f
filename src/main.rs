//! nlsparql - builds natural-language-to-SPARQL training datasets.
//!
//! Usage:
//!   nlsparql lcquad --train train.json --test test.json --templates templates.json -o lcquad.json
//!   nlsparql monument --nl data.en --sparql data.sparql --templates templates.json -o monument.json
//!   nlsparql fetch-answers -i lcquad.json -o lcquad.json

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use nlsparql::config::BuildConfig;
use nlsparql::core::TokenTable;
use nlsparql::dataset::{kb_intersection_rate, Dataset, DatasetStats, Split};
use nlsparql::parsing::query_normalizer::QueryNormalizer;
use nlsparql::querying::{fetch_answers, SparqlEndpoint, SparqlValidator};
use nlsparql::sources::{BatchReport, BuildOutput, CorpusAdapter, DbnqaAdapter, LcquadAdapter, MonumentAdapter};
use nlsparql::templates::extraction::derive_templates;
use nlsparql::templates::oov::{used_kb_elements, KbPools, OovGenerator};
use nlsparql::templates::TemplateLibrary;
use serde_json::Value;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nlsparql")]
#[command(about = "Build natural-language-to-SPARQL datasets from LC-QuAD, Monument and DBNQA")]
struct Cli {
    /// JSON build configuration; defaults apply to absent keys
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a dataset from the LC-QuAD train/test JSON files
    Lcquad {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        test: PathBuf,
        #[arg(long)]
        templates: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build a dataset from Monument parallel files
    Monument {
        #[command(flatten)]
        files: ParallelFiles,
        /// Template library used to assign ids and regenerate variants
        #[arg(long)]
        templates: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build a dataset from DBNQA parallel files
    Dbnqa {
        #[command(flatten)]
        files: ParallelFiles,
        /// Keep only the first N pairs
        #[arg(long)]
        subset: Option<usize>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Convert intermediary queries, one per line, to pure SPARQL
    ToPure {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Look up the answer of every entry on the SPARQL endpoint
    FetchAnswers {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Query again entries that already hold a result
        #[arg(long)]
        force: bool,
    },
    /// Derive a template library from a dataset's pure queries
    Templates {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Synthesize an out-of-vocabulary test dataset
    Oov {
        #[arg(long)]
        templates: PathBuf,
        /// Dataset whose KB elements are excluded from the pools
        #[arg(long)]
        reference: PathBuf,
        /// SPARQL JSON results listing candidate ontology elements
        #[arg(long)]
        ontologies: PathBuf,
        /// SPARQL JSON results listing candidate resources with labels
        #[arg(long)]
        resources: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print split sizes and template counts
    Stats {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Report entries whose pure query does not parse
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ParallelFiles {
    /// Natural-language side, one question per line
    #[arg(long)]
    nl: PathBuf,
    /// SPARQL side, one intermediary query per line
    #[arg(long)]
    sparql: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nlsparql=info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => BuildConfig::from_json_file(path)?,
        None => BuildConfig::default(),
    };

    match cli.command {
        Command::Lcquad { train, test, templates, output } => {
            let adapter = LcquadAdapter::from_files(train, test, templates)?;
            build(&adapter, &config, &output)?;
        }
        Command::Monument { files, templates, output } => {
            let adapter = MonumentAdapter::from_files(files.nl, files.sparql, templates)?;
            build(&adapter, &config, &output)?;
        }
        Command::Dbnqa { files, subset, output } => {
            let adapter = DbnqaAdapter::from_files(files.nl, files.sparql)?.with_subset(subset);
            build(&adapter, &config, &output)?;
        }
        Command::ToPure { input, output } => {
            let normalizer = QueryNormalizer::with_config(TokenTable::dbpedia(), &config.normalizer)?;
            let mut lines = Vec::new();
            for (i, line) in fs::read_to_string(&input)?.lines().enumerate() {
                match normalizer.to_pure_sparql(&normalizer.correct_query(line)) {
                    Ok(pure) => lines.push(pure),
                    Err(e) => {
                        error!("Line {}: {}", i + 1, e);
                        lines.push(String::new());
                    }
                }
            }
            fs::write(&output, lines.join("\n") + "\n")?;
            info!("Wrote {} queries to {}", lines.len(), output.display());
        }
        Command::FetchAnswers { input, output, force } => {
            let mut dataset = Dataset::load(&input)?;
            let normalizer = QueryNormalizer::with_config(TokenTable::dbpedia(), &config.normalizer)?;
            let endpoint = SparqlEndpoint::new(config.endpoint.clone())?;
            let report = fetch_answers(&endpoint, &normalizer, dataset.entries_mut(), force).await;
            info!("Answer lookup: {}", report);
            dataset.save(&output)?;
        }
        Command::Templates { input, output } => {
            let dataset = Dataset::load(&input)?;
            let templates = derive_templates(dataset.entries(), &config.templates.keep_predicates);
            info!("Derived {} templates from {} entries", templates.len(), dataset.len());
            write_json(&output, &templates)?;
        }
        Command::Oov { templates, reference, ontologies, resources, output } => {
            let library = TemplateLibrary::from_json_file(templates)?;
            let reference = Dataset::load(&reference)?;
            let used = used_kb_elements(reference.entries());
            let pools = KbPools::from_sparql_results(&read_json(&ontologies)?, &read_json(&resources)?, &used)?;
            let dataset = OovGenerator::new(pools, config.seed).generate(&library, config.oov_size)?;
            info!("Generated {} out-of-vocabulary entries", dataset.len());
            dataset.save(&output)?;
        }
        Command::Stats { input } => {
            let dataset = Dataset::load(&input)?;
            println!("{}", DatasetStats::compute(&dataset));
            let rate = kb_intersection_rate(dataset.entries_in(Split::Train), dataset.entries_in(Split::Test));
            match rate {
                Some(rate) => println!("KB tokens of test seen in train: {:.2}%", rate * 100.0),
                None => println!("KB tokens of test seen in train: n/a"),
            }
        }
        Command::Validate { input } => {
            let dataset = Dataset::load(&input)?;
            let report = SparqlValidator::with_rules(config.normalizer.sep_dots.clone()).validate_dataset(dataset.entries());
            print_failures(&report);
            println!("{}", report);
        }
    }

    Ok(())
}

fn build<A: CorpusAdapter>(adapter: &A, config: &BuildConfig, output: &Path) -> nlsparql::Result<()> {
    let BuildOutput { dataset, report } = adapter.build(config)?;
    info!("{}: {} entries, {}", adapter.source_name(), dataset.len(), report);
    print_failures(&report);
    dataset.save(output)
}

fn print_failures(report: &BatchReport) {
    for failure in &report.failures {
        println!("  {}: {}", failure.entry_id, failure.error);
    }
}

fn read_json(path: &Path) -> nlsparql::Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> nlsparql::Result<()> {
    let writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

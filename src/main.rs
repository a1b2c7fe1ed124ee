use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use tablescout::config::ScoutConfig;
use tablescout::llm::HttpLlm;
use tablescout::logging::init_logging;
use tablescout::orchestrator::Orchestrator;
use tablescout::table::{self, html};
use tablescout::web::{HttpFetcher, PageFetcher};

#[derive(Parser)]
#[command(name = "tablescout", version, about = "Table extraction, chart rendering, and LLM-backed question answering")]
struct Cli {
    /// TOML config file; defaults plus TABLESCOUT_* env overrides otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer the questions in a task file, optionally with attachments
    Answer {
        /// Task description file (e.g. questions.txt)
        questions: PathBuf,

        /// Directory of tabular attachments (.csv / .tsv)
        #[arg(long)]
        attachments: Option<PathBuf>,

        /// Write the JSON answer array here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Extract the most relevant table from a page or HTML file as JSON records
    Extract {
        /// Page URL to fetch
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,

        /// Local HTML file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Comma-separated column keywords; numeric density decides when omitted
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Write the JSON records here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = match &cli.config {
        Some(path) => ScoutConfig::load_from_file(path)?,
        None => ScoutConfig::load_from_env(),
    };
    // The API key is environment-only, even when a config file is used.
    if config.llm.api_key.is_none() {
        config.llm.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
    }

    match cli.command {
        Commands::Answer { questions, attachments, output } => {
            answer_command(&config, questions, attachments, output).await
        }
        Commands::Extract { url, file, keywords, output } => {
            extract_command(&config, url, file, keywords, output).await
        }
    }
}

async fn answer_command(
    config: &ScoutConfig,
    questions: PathBuf,
    attachments_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let task_text = std::fs::read_to_string(&questions)
        .map_err(|e| anyhow!("cannot read task file {:?}: {}", questions, e))?;

    let mut attachments: Vec<(String, Vec<u8>)> = Vec::new();
    if let Some(dir) = attachments_dir {
        for entry in std::fs::read_dir(&dir)
            .map_err(|e| anyhow!("cannot read attachments dir {:?}: {}", dir, e))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let name = entry.file_name().to_string_lossy().to_string();
                attachments.push((name, std::fs::read(entry.path())?));
            }
        }
        info!(count = attachments.len(), "attachments loaded");
    }

    let fetcher = HttpFetcher::new(config)?;
    let llm = HttpLlm::new(config)?;
    let orchestrator = Orchestrator::new(config, &fetcher, &llm);

    let answers = orchestrator.answer(&task_text, &attachments).await?;
    let rendered = serde_json::to_string_pretty(&answers)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            info!(?path, answers = answers.len(), "answers written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn extract_command(
    config: &ScoutConfig,
    url: Option<String>,
    file: Option<PathBuf>,
    keywords: Vec<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let html_text = match (url, file) {
        (Some(url), _) => HttpFetcher::new(config)?.fetch(&url).await?,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow!("cannot read HTML file {:?}: {}", path, e))?,
        (None, None) => return Err(anyhow!("either --url or --file is required")),
    };

    let tables = html::parse_tables(&html_text)?;
    let sample = config.limits.classify_sample_rows;

    let selected = if keywords.is_empty() {
        table::select_by_density(&tables, sample)?.1
    } else {
        let kw: Vec<&str> = keywords.iter().map(String::as_str).collect();
        table::select_by_keywords(&tables, &kw, sample)?.1
    };

    info!(
        rows = selected.row_count(),
        columns = selected.columns.len(),
        numeric = selected.numeric_columns().len(),
        "table selected"
    );

    let records = serde_json::to_string_pretty(&selected.head_records(selected.row_count()))?;
    match output {
        Some(path) => std::fs::write(&path, &records)?,
        None => println!("{records}"),
    }
    Ok(())
}

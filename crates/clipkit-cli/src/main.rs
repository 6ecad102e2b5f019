//! Clipkit CLI - export bookmark collections and annotate Markdown notes

use clap::{Parser, Subcommand};
use clipkit::{
    collection_id_from_url, AnnotatorConfig, ChatAnnotator, CollectionExporter, ConfigLoader,
    DocumentPipeline, ExportEvent, Session, SessionOptions, COOKIE_ENV, DEFAULT_DOWNLOAD_DIR,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Clipkit - collection exporter and LLM annotator for Markdown notes
#[derive(Parser, Debug)]
#[command(name = "clipkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prepend an LLM-generated annotation to every Markdown file in the input directory
    Annotate {
        /// Config file (created from config.example.yaml next to it if missing)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Export every answer and post of a collection as Markdown files
    Export {
        /// Collection URL (or bare collection id)
        collection_url: String,

        /// Directory for the exported files
        #[arg(long, short, default_value = DEFAULT_DOWNLOAD_DIR)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Annotate { config } => run_annotate(config).await,
        Commands::Export {
            collection_url,
            output,
        } => run_export(&collection_url, output).await,
    }
}

async fn run_annotate(config_path: Option<PathBuf>) {
    let config = load_config(config_path).unwrap_or_else(|e| fail(&e));

    let annotator = ChatAnnotator::from_env(config.ai.clone(), config.system_prompt.clone())
        .unwrap_or_else(|e| fail(&e));
    let pipeline = DocumentPipeline::new(Box::new(annotator));

    match pipeline.process(&config.input_dir, &config.output_dir).await {
        Ok(summary) => writeln_safe(&format!(
            "Done: {summary} (output in {})",
            config.output_dir.display()
        )),
        Err(e) => fail(&format!("processing {} failed: {e}", config.input_dir.display())),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<AnnotatorConfig, clipkit::ConfigError> {
    ConfigLoader::load(path.as_deref())?.validate()
}

async fn run_export(collection_url: &str, output: PathBuf) {
    let collection_id = collection_id_from_url(collection_url)
        .unwrap_or_else(|| fail(&format!("no collection id in {collection_url}")));

    let cookie = match std::env::var(COOKIE_ENV) {
        Ok(cookie) if !cookie.trim().is_empty() => cookie,
        _ => fail(&clipkit::ConfigError::MissingEnv(COOKIE_ENV)),
    };

    tracing::info!(collection_id = %collection_id, output = %output.display(), "Starting export");
    let session =
        Session::new(SessionOptions::default().cookie(cookie)).unwrap_or_else(|e| fail(&e));
    let exporter = CollectionExporter::new(session, output);

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let result = exporter
        .export(&collection_id, |event| report(&progress, event))
        .await;
    progress.finish_and_clear();

    match result {
        Ok(summary) => writeln_safe(&format!(
            "Done: {summary} (output in {})",
            exporter.output_dir().display()
        )),
        Err(e) => fail(&e),
    }
}

fn report(progress: &ProgressBar, event: ExportEvent) {
    match event {
        ExportEvent::Listed { total } => {
            progress.set_length(total as u64);
            progress.println(format!("Found {total} exportable answers or posts"));
        }
        ExportEvent::Skipped { title } => {
            progress.set_message(format!("already exported: {title}"));
            progress.inc(1);
        }
        ExportEvent::Written { path } => {
            progress.set_message(path.display().to_string());
            progress.inc(1);
        }
        ExportEvent::Failed { url, error } => {
            progress.println(format!("Failed: {url} ({error})"));
            progress.inc(1);
        }
    }
}

/// Print a fatal error and exit with status 1
fn fail(err: &dyn std::fmt::Display) -> ! {
    eprintln!("Error: {}", err);
    std::process::exit(1);
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

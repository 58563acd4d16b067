//! grace-bible-rs: terminal Bible reader with spoken chapters and reading progress.

mod app;
mod audio;
mod catalog;
mod config;
mod content;
mod error;
mod gemini;
mod input;
mod notifier;
mod player;
mod progress;
mod selection;
mod service;
mod speech;
mod view;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "grace-bible-rs", about = "Terminal Bible reader")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Book id to open at startup (e.g. genesis, john)
    #[arg(short, long)]
    book: Option<String>,

    /// Chapter to open at startup
    #[arg(long)]
    chapter: Option<u32>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr; stdout belongs to the reader view
    let filter = if args.verbose {
        EnvFilter::new("debug,reqwest=info,hyper=info")
    } else {
        EnvFilter::new("warn,grace_bible_rs=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("grace-bible-rs starting");

    let config = config::Config::load(args.config.as_deref());

    let gemini = Arc::new(gemini::GeminiClient::new(config.gemini.clone())?);
    let output = Arc::new(audio::RodioOutput::new(audio::StreamFormat::from(&config.audio)));

    let mut selection = selection::Selection::default();
    if let Some(id) = args.book.as_deref() {
        if !selection.select_book(id) {
            warn!("Unknown book '{id}', opening {}", selection.book().id);
        }
    }
    if let Some(chapter) = args.chapter {
        selection.select_chapter(chapter);
    }

    let store = progress::ProgressStore::new(config.storage.progress_path.clone());
    info!("Progress file: {}", store.path().display());

    let app = app::ReaderApp::new(
        selection,
        content::ContentLoader::new(gemini.clone()),
        player::PlaybackController::new(output, gemini),
        store,
        notifier::Notifier::new(&config.feedback),
    );

    let mut service = service::ReaderService::new(app);
    service.run().await?;

    Ok(())
}

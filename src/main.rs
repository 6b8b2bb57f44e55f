mod config;
mod logging;
mod search;
mod tui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{ArgAction, Parser};
use dotenvy::dotenv;
use tracing::info;

use crate::config::AppConfig;
use crate::search::{
    HttpSuggestionSource, Market, SearchOptions, Suggestion, SymbolSearchController, Tab,
};
use crate::tui::TuiApp;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "symsearch",
    version,
    about = "Interactive trading symbol search (TUI/CLI)"
)]
pub(crate) struct Cli {
    /// Run a single search and print the results (disable TUI)
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_tui: bool,

    /// Query for --no-tui mode
    #[arg(long, short)]
    pub query: Option<String>,

    /// Active market
    #[arg(long, value_enum)]
    pub market: Option<Market>,

    /// Initial filter tab (defaults to the market's tab)
    #[arg(long, value_enum)]
    pub tab: Option<Tab>,

    /// Symbol search endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Name of the query string parameter carrying the search text
    #[arg(long)]
    pub query_param: Option<String>,

    /// Quiet period after the last keystroke before a request is sent
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Color theme (dark, light)
    #[arg(long)]
    pub theme: Option<String>,

    /// Input placeholder text
    #[arg(long)]
    pub placeholder: Option<String>,

    /// Log level (error,warn,info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file used while the TUI owns the terminal
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    if cli.no_tui {
        logging::init_stderr_logging(&cli.log_level)?;
    } else {
        let path = cli
            .log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("symsearch.log"));
        logging::init_file_logging(&cli.log_level, &path)?;
    }

    let cfg = AppConfig::from_cli(&cli)?;
    info!(?cfg, "app config");

    if cli.no_tui {
        run_once(&cli, &cfg).await
    } else {
        run_tui(&cli, &cfg)
    }
}

fn build_source(cfg: &AppConfig) -> Result<Arc<HttpSuggestionSource>> {
    let source = HttpSuggestionSource::new(&cfg.endpoint, &cfg.query_param, &cfg.http)?;
    Ok(Arc::new(source))
}

fn run_tui(cli: &Cli, cfg: &AppConfig) -> Result<()> {
    let source = build_source(cfg)?;
    let mut app = TuiApp::new(
        "symsearch",
        source,
        SearchOptions::from_config(cfg),
        &cfg.theme,
    );
    if let Some(tab) = cli.tab {
        app.controller.set_tab(tab);
    }
    // The event loop polls the terminal synchronously; searches keep running on the workers.
    let res = tokio::task::block_in_place(|| app.run());
    if let Some(s) = &app.selected {
        println!("{}", s.canonical_symbol);
    }
    res
}

async fn run_once(cli: &Cli, cfg: &AppConfig) -> Result<()> {
    let Some(query) = cli.query.as_deref() else {
        bail!("--no-tui requires --query <TEXT>");
    };

    let source = build_source(cfg)?;
    let mut controller = SymbolSearchController::new(
        source,
        SearchOptions::from_config(cfg),
        Box::new(|_: &str| {}),
        Box::new(|_: &Suggestion| {}),
    );
    if let Some(tab) = cli.tab {
        controller.set_tab(tab);
    }
    controller.set_query(query);
    controller.run_until_idle().await;

    let session = controller.session();
    info!(
        market = %session.active_market,
        tab = session.active_tab.title(),
        count = session.filtered_results.len(),
        "search finished"
    );
    if session.filtered_results.is_empty() {
        eprintln!("No symbols match");
    }
    let mut out = io::stdout().lock();
    print_results(&mut out, &session.filtered_results)?;
    Ok(())
}

fn print_results(out: &mut impl Write, results: &[Suggestion]) -> io::Result<()> {
    for s in results {
        writeln!(
            out,
            "{:<24} {:<40} {:<8} {}",
            s.canonical_symbol,
            s.description.as_deref().unwrap_or("-"),
            s.exchange.as_deref().unwrap_or("-"),
            s.asset_type.as_deref().unwrap_or("-"),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod main_test;

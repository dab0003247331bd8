mod app;
mod catalog;
mod config;
mod error;
mod fetch;
mod pipeline;
mod ui;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::app::App;
use crate::catalog::Dataset;
use crate::config::Config;
use crate::error::Result;

fn setup_logging() -> Result<()> {
    let data_dir = config::data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let file_appender = tracing_appender::rolling::daily(&data_dir, "terebi.log");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("terebi=info".parse().unwrap()))
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // File-based logging; the TUI owns the terminal
    if let Err(e) = setup_logging() {
        eprintln!("Warning: Could not set up logging: {}", e);
    }

    info!("Starting terebi");

    let config = Config::load()?;
    info!(sources = config.sources.len(), "Loaded config");

    let mut app = App::new(config);

    // Optional local document instead of the network dataset. A bad file
    // is reported on the status line and the app falls back to fetching.
    if let Some(path) = std::env::args().nth(1) {
        match std::fs::read_to_string(&path) {
            Ok(text) => match Dataset::parse(&text) {
                Ok(dataset) => app.import_dataset(dataset, &path),
                Err(e) => {
                    info!(file = %path, error = %e, "Local file rejected");
                    app.set_status(format!("文件 \"{}\" 不是有效的JSON格式。", path));
                }
            },
            Err(e) => app.set_status(format!("无法读取文件 {}: {}", path, e)),
        }
    }

    let mut terminal = app::init_terminal()?;
    let result = app.run(&mut terminal).await;
    app::restore_terminal()?;

    result
}

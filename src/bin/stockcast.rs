//! stockcast CLI: load price history, moving averages and predictions for a
//! symbol through the configured backend and print the chart rows.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use stockcast_backend::client::dashboard::{load_dashboard, Dashboard, DashboardRequest};
use stockcast_backend::client::gateway_from_config;
use stockcast_backend::config::ClientConfig;
use stockcast_backend::logging::{self, LogOutput, LoggingConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(
    name = "stockcast",
    about = "Fetch a stock's daily history with moving averages and predictions"
)]
struct Cli {
    /// Ticker symbol (e.g., GOOG, AAPL).
    symbol: String,

    /// Start date (YYYY-MM-DD). Defaults to 2012-01-01.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Moving average window in days; repeat for several. Defaults to MA_WINDOWS or 50/100/200.
    #[arg(long = "window")]
    windows: Vec<usize>,

    /// Only print the most recent N rows.
    #[arg(long)]
    last: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_logging(LoggingConfig::from_env("stockcast-cli", LogOutput::Stderr))?;

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let gateway = gateway_from_config(&config)?;

    if cli.windows.contains(&0) {
        bail!("--window must be a positive number of days");
    }
    let request = DashboardRequest {
        symbol: cli.symbol.clone(),
        start: cli.start,
        end: cli.end,
        windows: if cli.windows.is_empty() {
            config.windows.clone()
        } else {
            cli.windows.clone()
        },
    };

    let dashboard = tokio::select! {
        result = load_dashboard(gateway.as_ref(), &request) => result?,
        _ = tokio::signal::ctrl_c() => bail!("cancelled"),
    };

    let dashboard = keep_last(dashboard, cli.last);
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
        OutputFormat::Table => print!("{}", render_table(&dashboard)),
    }

    Ok(())
}

fn keep_last(mut dashboard: Dashboard, last: Option<usize>) -> Dashboard {
    if let Some(n) = last {
        let skip = dashboard.rows.len().saturating_sub(n);
        dashboard.rows.drain(..skip);
    }
    dashboard
}

fn render_table(dashboard: &Dashboard) -> String {
    let mut out = format!("{} ({} trading days)\n", dashboard.symbol, dashboard.bar_count);
    if let Some(note) = &dashboard.note {
        out.push_str(&format!("note: {note}\n"));
    }

    let ma_keys: Vec<String> = dashboard.windows.iter().map(|w| format!("ma{w}")).collect();

    out.push_str(&format!("{:<12}{:>12}", "date", "price"));
    for key in &ma_keys {
        out.push_str(&format!("{key:>12}"));
    }
    out.push_str(&format!("{:>12}\n", "predicted"));

    for row in &dashboard.rows {
        out.push_str(&format!("{:<12}{:>12.2}", row.date.to_string(), row.price));
        for key in &ma_keys {
            let cell = row.moving_averages.get(key).copied().flatten();
            out.push_str(&format_cell(cell));
        }
        out.push_str(&format_cell(row.predicted));
        out.push('\n');
    }

    out
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:>12.2}"),
        None => format!("{:>12}", "-"),
    }
}

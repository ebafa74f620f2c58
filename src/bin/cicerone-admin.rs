use anyhow::{Context, Result};
use cicerone::analytics::{
    summarize, EventRecord, PageviewBeacon, PageviewRecord, SchemaReport, StatsWindow,
};
use cicerone::client::BeaconClient;
use cicerone::config::Config;
use cicerone::storage;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cicerone-admin")]
#[command(about = "Cicerone analytics management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the analytics tables and country coverage
    CheckSchema,
    /// Print the dashboard summary as JSON
    Stats {
        /// Trailing window in days
        #[arg(short, long, default_value_t = 7)]
        days: i64,
    },
    /// List the most recently recorded pageviews or events
    Recent {
        /// Number of rows to show
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
        /// Show custom events instead of pageviews
        #[arg(long)]
        events: bool,
    },
    /// Send a single pageview beacon to a running server
    Track {
        /// Analytics base URL, e.g. http://127.0.0.1:8080/api/analytics
        #[arg(long)]
        base_url: String,
        /// Page path to record
        #[arg(long)]
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        referrer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CheckSchema => {
            let config = Config::from_env()?;
            let storage = storage::connect(&config.database).await?;
            let report = storage
                .schema_report()
                .await
                .context("Failed to inspect the database; is DATABASE_URL correct and reachable?")?;
            print_schema_report(&report);
        }
        Commands::Stats { days } => {
            anyhow::ensure!(days >= 1, "--days must be a positive integer");
            let config = Config::from_env()?;
            let storage = storage::connect(&config.database).await?;
            let summary = summarize(storage.as_ref(), StatsWindow::ending_now(days))
                .await
                .context("Failed to compute stats; run `cicerone-admin check-schema`")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Recent { limit, events } => {
            anyhow::ensure!(limit >= 1, "--limit must be a positive integer");
            let config = Config::from_env()?;
            let storage = storage::connect(&config.database).await?;
            if events {
                let rows = storage.recent_events(limit).await?;
                print_recent_events(&rows);
            } else {
                let rows = storage.recent_pageviews(limit).await?;
                print_recent_pageviews(&rows);
            }
        }
        Commands::Track {
            base_url,
            url,
            title,
            referrer,
        } => {
            let client = BeaconClient::new(base_url);
            let beacon = PageviewBeacon {
                url: Some(url.clone()),
                title,
                referrer,
                ..Default::default()
            };
            if client.track_pageview(&beacon).await {
                println!("✓ Recorded pageview for '{}'", url);
            } else {
                println!(
                    "⚠ Pageview for '{}' was not accepted (run with RUST_LOG=debug for details)",
                    url
                );
            }
        }
    }

    Ok(())
}

fn print_schema_report(report: &SchemaReport) {
    println!("Tables ({}):", report.tables.len());
    for table in &report.tables {
        println!("  - {}", table);
    }

    if !report.has_pageview_table() {
        println!();
        println!("✗ Table 'analytics_pageviews' does not exist.");
        println!("  Start the server once (it creates the analytics tables),");
        println!("  then re-run this check.");
        return;
    }

    if !report.has_event_table() {
        println!("⚠ Table 'analytics_events' does not exist; event beacons will fail.");
    }

    println!();
    println!("Columns of analytics_pageviews:");
    for column in &report.pageview_columns {
        println!("  - {}", column);
    }

    if !report.has_country_column() {
        println!();
        println!("✗ Column 'country' is missing from analytics_pageviews.");
        println!("  ALTER TABLE analytics_pageviews ADD COLUMN country VARCHAR(2);");
        return;
    }

    println!();
    println!("{:<24} {}", "Total pageviews:", report.total_pageviews);
    println!("{:<24} {}", "With country:", report.with_country);
    println!("{:<24} {}", "Without country:", report.without_country);

    if report.countries.is_empty() {
        println!();
        println!("⚠ No pageview has a country yet. Possible reasons:");
        println!("  - no visits since country detection was enabled");
        println!("  - visitors come from local or private addresses");
        println!("  - GEOIP_DB_PATH is not set");
    } else {
        println!();
        println!("{:<10} {}", "Country", "Pageviews");
        println!("{}", "-".repeat(24));
        for (country, count) in &report.countries {
            println!("{:<10} {}", country, count);
        }
    }
}

fn format_timestamp(created_at: i64) -> String {
    chrono::DateTime::from_timestamp(created_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| created_at.to_string())
}

fn short_hash(visitor_hash: &str) -> &str {
    visitor_hash.get(..12).unwrap_or(visitor_hash)
}

fn print_recent_pageviews(rows: &[PageviewRecord]) {
    if rows.is_empty() {
        println!("No pageviews recorded yet.");
        return;
    }

    println!(
        "{:<20} {:<13} {:<8} {:<30} {}",
        "Time (UTC)", "Visitor", "Country", "URL", "Referrer"
    );
    println!("{}", "-".repeat(90));
    for row in rows {
        println!(
            "{:<20} {:<13} {:<8} {:<30} {}",
            format_timestamp(row.created_at),
            short_hash(&row.visitor_hash),
            row.country.as_deref().unwrap_or("-"),
            row.url,
            row.referrer.as_deref().unwrap_or("-")
        );
    }
}

fn print_recent_events(rows: &[EventRecord]) {
    if rows.is_empty() {
        println!("No events recorded yet.");
        return;
    }

    println!(
        "{:<20} {:<13} {:<24} {:<30} {}",
        "Time (UTC)", "Visitor", "Event", "URL", "Data"
    );
    println!("{}", "-".repeat(100));
    for row in rows {
        println!(
            "{:<20} {:<13} {:<24} {:<30} {}",
            format_timestamp(row.created_at),
            short_hash(&row.visitor_hash),
            row.event_name,
            row.url,
            row.event_data.as_deref().unwrap_or("-")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_is_utc() {
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn test_short_hash() {
        let hash = "3f2a9c0d41b7e6f58a1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f3a";
        assert_eq!(short_hash(hash), "3f2a9c0d41b7");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_recent_command_defaults() {
        let cli = Cli::try_parse_from(["cicerone-admin", "recent"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Recent {
                limit: 20,
                events: false
            }
        ));

        let cli = Cli::try_parse_from(["cicerone-admin", "recent", "-l", "5", "--events"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Recent {
                limit: 5,
                events: true
            }
        ));
    }
}

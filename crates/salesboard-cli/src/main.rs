//! `salesboard`: run one sales report against a warehouse and print it.
//!
//! # Usage
//!
//! ```text
//! salesboard metrics
//! salesboard --format delimited magnitude --by category
//! salesboard trend --granularity month --reset-every year
//! salesboard report customers --as-of 2024-12-31
//! ```
//!
//! Settings come from `salesboard.toml` (or `--config`), overridden by
//! `SALESBOARD_*` environment variables, overridden by flags.

mod render;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use render::Renderer;
use salesboard_analytics::{
  aggregate::{Dimension, GroupBy, Measure, Rank, Reducer, part_to_whole, ranked},
  kpi::{date_range, key_metrics},
  report::{customer_report, product_report},
  segment::{cost_band_counts, cost_bands, customer_profiles, segment_counts},
  trend::{Granularity, cumulative, periods},
  yoy::year_over_year,
};
use salesboard_core::{Dataset, load_dataset};
use salesboard_store_sqlite::SqliteWarehouse;
use settings::{OutputFormat, Settings};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "salesboard", version, about = "Sales trend and segmentation reports")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "salesboard.toml")]
  config: PathBuf,

  /// SQLite warehouse to read; overrides `database_path`.
  #[arg(long, env = "SALESBOARD_DATABASE", value_name = "PATH")]
  database: Option<PathBuf>,

  /// Output format; overrides `output.format`.
  #[arg(long, value_enum)]
  format: Option<OutputFormat>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Headline totals: sales, quantity, orders, products, customers.
  Metrics,

  /// First and last order dates and customer birthdate bounds.
  DateRange,

  /// A measure aggregated per group, largest first.
  Magnitude {
    #[arg(long)]
    by:      Dimension,
    #[arg(long, default_value_t = Measure::SalesAmount)]
    measure: Measure,
    #[arg(long, default_value_t = Reducer::Sum)]
    reducer: Reducer,
  },

  /// The best or worst groups by total sales.
  Rank {
    #[arg(long)]
    by:      Dimension,
    /// Keep the N largest groups.
    #[arg(long, conflicts_with = "bottom", default_value_t = 5)]
    top:     usize,
    /// Keep the N smallest groups instead.
    #[arg(long)]
    bottom:  Option<usize>,
    #[arg(long, default_value_t = Measure::SalesAmount)]
    measure: Measure,
  },

  /// A measure per period; running totals with `--cumulative` or
  /// `--reset-every`.
  Trend {
    #[arg(long, default_value_t = Granularity::Year)]
    granularity: Granularity,
    #[arg(long, default_value_t = Measure::SalesAmount)]
    measure:     Measure,
    #[arg(long)]
    cumulative:  bool,
    /// Restart running totals at each boundary of this coarser period.
    #[arg(long)]
    reset_every: Option<Granularity>,
  },

  /// Yearly product sales against the product average and the prior year.
  Yoy,

  /// Each group's share of the overall total.
  PartToWhole {
    #[arg(long)]
    by:      Dimension,
    #[arg(long, default_value_t = Measure::SalesAmount)]
    measure: Measure,
  },

  /// Customer segments or product cost bands.
  Segments {
    #[command(subcommand)]
    target: Target,
    /// List every customer or product with its class instead of counts.
    #[arg(long, global = true)]
    detail: bool,
  },

  /// Per-customer or per-product activity report.
  Report {
    #[command(subcommand)]
    target: Target,
    /// Reference date for ages and recency; defaults to today.
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    as_of:  Option<NaiveDate>,
  },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
  Customers,
  Products,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout carries the report.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(database) = &cli.database {
    settings.database_path = settings::expand_tilde(database);
  }
  if let Some(format) = cli.format {
    settings.output.format = format;
  }
  let renderer = Renderer::new(&settings.output)?;

  let warehouse = SqliteWarehouse::open(&settings.database_path)
    .await
    .with_context(|| format!("failed to open warehouse at {:?}", settings.database_path))?;
  let dataset = load_dataset(&warehouse)
    .await
    .context("failed to load warehouse tables")?;
  tracing::info!(
    facts = dataset.sales().len(),
    customers = dataset.customers().len(),
    products = dataset.products().len(),
    "warehouse loaded"
  );

  let output = run(cli.command, &dataset, &settings, &renderer)?;
  println!("{output}");
  Ok(())
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

fn run(
  command: Command,
  dataset: &Dataset,
  settings: &Settings,
  renderer: &Renderer,
) -> anyhow::Result<String> {
  let segmentation = &settings.segmentation;

  match command {
    Command::Metrics => renderer.records(&key_metrics(dataset).as_rows()),

    Command::DateRange => renderer.records(date_range(dataset).as_slice()),

    Command::Magnitude { by, measure, reducer } => {
      let name = format!("{reducer}_{measure}");
      let result = GroupBy::new([by]).measure(name, measure, reducer).run(dataset);
      renderer.table(&result.to_table())
    }

    Command::Rank { by, top, bottom, measure } => {
      let rank = bottom.map_or(Rank::Top(top), Rank::Bottom);
      let result = ranked(dataset, by, measure, Reducer::Sum, rank);
      renderer.table(&result.to_table())
    }

    Command::Trend { granularity, measure, cumulative: running, reset_every } => {
      let rows = periods(dataset.sales(), granularity, measure);
      if running || reset_every.is_some() {
        let rows: Vec<_> = cumulative(&rows, reset_every).collect();
        renderer.records(&rows)
      } else {
        renderer.records(&rows)
      }
    }

    Command::Yoy => renderer.records(&year_over_year(dataset)),

    Command::PartToWhole { by, measure } => {
      let shares =
        part_to_whole(dataset, by, measure, settings.part_to_whole.zero_total)
          .with_context(|| format!("part-to-whole of {measure} by {by}"))?;
      renderer.records(&shares)
    }

    Command::Segments { target: Target::Customers, detail } => {
      if detail {
        renderer.records(&customer_profiles(dataset, segmentation))
      } else {
        renderer.records(&segment_counts(dataset, segmentation))
      }
    }

    Command::Segments { target: Target::Products, detail } => {
      let rule = segmentation.cost_bands;
      if detail {
        renderer.records(&cost_bands(dataset.products(), rule))
      } else {
        renderer.records(&cost_band_counts(dataset.products(), rule))
      }
    }

    Command::Report { target, as_of } => {
      let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
      match target {
        Target::Customers => {
          renderer.records(&customer_report(dataset, as_of, segmentation))
        }
        Target::Products => renderer.records(&product_report(dataset, as_of)),
      }
    }
  }
}

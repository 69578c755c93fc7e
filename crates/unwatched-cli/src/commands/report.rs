use super::report_ui::ReportUI;
use crate::output::Output;
use chrono::Utc;
use clap::{ArgAction, Args};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_report_config::{Config, SortOrder};
use media_report_core::{ReportOptions, ReportRunner, ReportSummary};
use media_report_sources::TautulliClient;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Args, Debug, Default, Clone)]
pub struct ReportArgs {
    /// Tautulli base URL (overrides tautulli.url)
    #[arg(long)]
    pub url: Option<String>,

    /// Tautulli API key (overrides tautulli.api_key)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Library name to scan (repeatable, replaces report.libraries)
    #[arg(long = "library", value_name = "NAME")]
    pub libraries: Vec<String>,

    /// Directory the two CSV files are written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Fetch and write rating keys oldest first
    #[arg(long, action = ArgAction::SetTrue)]
    pub ascending: bool,

    /// Fetch each rating key only once
    #[arg(long, action = ArgAction::SetTrue)]
    pub deduplicate: bool,

    /// Stop fetching metadata at the first key the server returns nothing for
    #[arg(long, action = ArgAction::SetTrue)]
    pub stop_at_end_of_range: bool,
}

impl ReportArgs {
    /// Layer the command line on top of the file config. Flags only ever turn
    /// options on; leaving one off keeps whatever the file says.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.tautulli.url = url.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.tautulli.api_key = api_key.clone();
        }
        if !self.libraries.is_empty() {
            config.report.libraries = self.libraries.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }
        if self.ascending {
            config.report.sort_order = SortOrder::Ascending;
        }
        if self.deduplicate {
            config.report.deduplicate = true;
        }
        if self.stop_at_end_of_range {
            config.failure_policy.stop_at_end_of_range = true;
        }
    }
}

pub async fn run_report(args: ReportArgs, config_path: &Path, output: &Output) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    args.apply_to(&mut config);

    if let Err(e) = config.validate() {
        output.error(format!("Invalid configuration: {}", e));
        if !config.tautulli.has_api_key() {
            output.info("Run 'unwatched config init' or pass --api-key to set the Tautulli API key.");
        }
        return Err(color_eyre::eyre::eyre!("Invalid configuration ({}): {}", config_path.display(), e));
    }

    debug!(
        config_file = %config_path.display(),
        url = %config.tautulli.url,
        libraries = ?config.report.libraries,
        "Configuration loaded"
    );

    let client = TautulliClient::new(
        &config.tautulli.url,
        config.tautulli.api_key.clone(),
        Duration::from_secs(config.tautulli.timeout_secs),
    )
    .wrap_err("Failed to create Tautulli client")?;
    info!(endpoint = client.endpoint(), "Starting unwatched media report");

    let runner = ReportRunner::new(Box::new(client), ReportOptions::from_config(&config))
        .with_observer(Box::new(ReportUI::new(*output)));

    let summary = match runner.run(Utc::now().timestamp()).await {
        Ok(summary) => summary,
        Err(e) => {
            output.error(format!("Report failed: {}", e));
            return Err(e).wrap_err("Report run failed");
        }
    };

    print_summary(&summary, output)
}

fn print_summary(summary: &ReportSummary, output: &Output) -> Result<()> {
    if !output.is_human() {
        let mut value = serde_json::to_value(summary).wrap_err("Failed to serialize report summary")?;
        if let Some(map) = value.as_object_mut() {
            map.insert("type".to_string(), serde_json::Value::from("summary"));
        }
        output.json(&value);
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Report Summary").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    table.add_row(vec![Cell::new("Libraries"), Cell::new(libraries_display(&summary.libraries))]);
    table.add_row(vec![Cell::new("Unwatched items"), Cell::new(summary.items_retained)]);
    table.add_row(vec![Cell::new("Rating keys"), Cell::new(summary.candidates)]);
    table.add_row(vec![Cell::new("Metadata fetched"), Cell::new(summary.metadata_attempted)]);
    table.add_row(vec![
        Cell::new("Movies"),
        Cell::new(format!("{} → {}", summary.movies, summary.movies_path.display())),
    ]);
    table.add_row(vec![
        Cell::new("Episodes"),
        Cell::new(format!("{} → {}", summary.shows, summary.shows_path.display())),
    ]);
    table.add_row(vec![Cell::new("Failures"), Cell::new(summary.failures.len())]);
    table.add_row(vec![Cell::new("Duration"), Cell::new(format!("{:.1}s", summary.duration.as_secs_f64()))]);
    println!();
    println!("{}", table);

    if let Some(key) = summary.stopped_at {
        output.info(format!(
            "{} Stopped at rating key {}: the server had no metadata for it",
            "→".bright_blue(),
            key
        ));
    }

    for failure in &summary.failures {
        output.warn(format!("{} {}: {}", failure.stage, failure.subject, failure.message));
    }

    output.success("Reports written");
    Ok(())
}

fn libraries_display(libraries: &[String]) -> String {
    if libraries.is_empty() {
        "<none matched>".to_string()
    } else {
        libraries.join(", ")
    }
}

use super::prompts;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_report_config::{Config, FailureAction, PathManager, PLACEHOLDER_API_KEY};
use media_report_core::select_libraries;
use media_report_sources::{MediaCatalog, TautulliClient};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

pub async fn run_config(cmd: ConfigCommands, config_path: &Path, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, config_path, output),
        ConfigCommands::Init {
            url,
            api_key,
            libraries,
            force,
        } => init_config(url, api_key, libraries, force, config_path, output).await,
    }
}

fn show_config(full: bool, config_path: &Path, output: &Output) -> Result<()> {
    if !config_path.exists() {
        output.warn(format!("Configuration file not found at: {}", config_path.display()));
        output.info("Showing defaults. Run 'unwatched config init' to create it.");
    }

    let config = super::load_config(config_path)?;
    let api_key_display = if full {
        config.tautulli.api_key.clone()
    } else {
        mask_string(&config.tautulli.api_key)
    };

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_path.display().to_string(),
            "exists": config_path.exists(),
            "tautulli": {
                "url": config.tautulli.url,
                "api_key": api_key_display,
                "timeout_secs": config.tautulli.timeout_secs,
            },
            "report": {
                "libraries": config.report.libraries,
                "max_age_seconds": config.report.max_age_seconds,
                "page_size": config.report.page_size,
                "sort_order": config.report.sort_order,
                "deduplicate": config.report.deduplicate,
                "movies_path": config.report.movies_path().display().to_string(),
                "shows_path": config.report.shows_path().display().to_string(),
            },
            "failure_policy": config.failure_policy,
        }));
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    println!("\n{}", "╔════════════════════════════════════════════════════════════╗".bright_white());
    println!("{}", "║".bright_white());
    println!("{} {}", "║".bright_white(), "Configuration".bright_cyan().bold());
    println!("{}", "╚════════════════════════════════════════════════════════════╝".bright_white());
    println!();

    let mut info_table = Table::new();
    info_table.set_header(vec![
        Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(config_path.display().to_string()),
    ]);
    info_table.load_preset(comfy_table::presets::UTF8_FULL);
    info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", info_table);
    println!();

    let mut tautulli_table = section_table("Tautulli");
    tautulli_table.add_row(vec![Cell::new("URL"), Cell::new(&config.tautulli.url)]);
    tautulli_table.add_row(vec![Cell::new("API Key"), Cell::new(api_key_display)]);
    tautulli_table.add_row(vec![Cell::new("Timeout"), Cell::new(format!("{}s", config.tautulli.timeout_secs))]);
    println!("{}", tautulli_table);
    println!();

    let mut report_table = section_table("Report");
    report_table.add_row(vec![Cell::new("Libraries"), Cell::new(config.report.libraries.join(", "))]);
    report_table.add_row(vec![
        Cell::new("Minimum Age"),
        Cell::new(format!(
            "{}s (~{} days)",
            config.report.max_age_seconds,
            config.report.max_age_seconds / 86_400
        )),
    ]);
    report_table.add_row(vec![Cell::new("Page Size"), Cell::new(config.report.page_size)]);
    report_table.add_row(vec![Cell::new("Sort Order"), Cell::new(format!("{:?}", config.report.sort_order))]);
    report_table.add_row(vec![Cell::new("Deduplicate"), Cell::new(check_mark(config.report.deduplicate))]);
    report_table.add_row(vec![
        Cell::new("Movies File"),
        Cell::new(config.report.movies_path().display().to_string()),
    ]);
    report_table.add_row(vec![
        Cell::new("Shows File"),
        Cell::new(config.report.shows_path().display().to_string()),
    ]);
    println!("{}", report_table);
    println!();

    let policy = &config.failure_policy;
    let mut policy_table = section_table("Failure Policy");
    policy_table.add_row(vec![Cell::new("Libraries"), Cell::new(action_display(policy.libraries))]);
    policy_table.add_row(vec![Cell::new("Library Items"), Cell::new(action_display(policy.library_items))]);
    policy_table.add_row(vec![Cell::new("Expansion"), Cell::new(action_display(policy.expansion))]);
    policy_table.add_row(vec![Cell::new("Metadata"), Cell::new(action_display(policy.metadata))]);
    policy_table.add_row(vec![
        Cell::new("Stop At End Of Range"),
        Cell::new(check_mark(policy.stop_at_end_of_range)),
    ]);
    println!("{}", policy_table);
    println!();

    Ok(())
}

async fn init_config(
    url_arg: Option<String>,
    api_key_arg: Option<String>,
    libraries_arg: Vec<String>,
    force: bool,
    config_path: &Path,
    output: &Output,
) -> Result<()> {
    if config_path.exists() && !force {
        output.warn(format!("Configuration file already exists at: {}", config_path.display()));
        if !prompts::prompt_yes_no("Update it?", Some(false))? {
            output.info("Leaving the existing configuration unchanged.");
            return Ok(());
        }
    }

    if config_path == super::default_config_path() {
        PathManager::default()
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;
    }

    let mut config = super::load_config(config_path)?;

    print_section_header("Tautulli API Setup", output);
    output.info("");
    print_instruction_list(
        &[
            "Open Tautulli and go to Settings → Web Interface",
            "Enable the API and copy the API key shown there",
            "Use the address you open Tautulli at, including any path prefix (e.g. /tautulli)",
        ],
        output,
    );
    output.info("");

    let url = match url_arg {
        Some(url) => url,
        None => prompts::prompt_string("Tautulli URL", Some(config.tautulli.url.as_str()))?,
    };
    config.tautulli.url = url.trim().to_string();

    let api_key = match api_key_arg {
        Some(key) => key,
        None => loop {
            let input = prompts::prompt_secret("Tautulli API Key", !config.tautulli.has_api_key())?;
            if input.trim().is_empty() {
                output.error("API key cannot be empty");
                continue;
            }
            break input;
        },
    };
    config.tautulli.api_key = api_key.trim().to_string();

    if libraries_arg.is_empty() {
        let current = config.report.libraries.join(", ");
        let answer = prompts::prompt_string("Libraries to scan (comma separated)", Some(current.as_str()))?;
        let libraries = prompts::parse_list(&answer);
        if !libraries.is_empty() {
            config.report.libraries = libraries;
        }
    } else {
        config.report.libraries = libraries_arg;
    }

    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Configuration is not valid: {}", e))?;

    verify_connection(&config, output).await;

    config
        .save_to_file(config_path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_path.display(), e))?;

    output.info("");
    output.success(format!("Configuration saved to {}", config_path.display()));
    output.info(format!("  URL: {}", config.tautulli.url));
    output.info(format!("  API Key: {}", mask_string(&config.tautulli.api_key)));
    output.info(format!("  Libraries: {}", config.report.libraries.join(", ")));

    Ok(())
}

/// List libraries once with the new settings and report which configured
/// names exist. Failures only warn; the file is saved either way.
async fn verify_connection(config: &Config, output: &Output) {
    output.info("");
    output.info("Verifying Tautulli connection...");

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );
    spinner.set_message("Fetching libraries table...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let client = match TautulliClient::new(
        &config.tautulli.url,
        config.tautulli.api_key.clone(),
        Duration::from_secs(config.tautulli.timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            spinner.finish_and_clear();
            output.warn(format!("Could not create Tautulli client: {}. Continuing anyway...", e));
            return;
        }
    };

    match client.libraries().await {
        Ok(all) => {
            spinner.finish_and_clear();
            let matched = select_libraries(all, &config.report.libraries);
            output.success(format!("Connected to Tautulli, {} configured libraries found", matched.len()));
            for name in missing_libraries(&config.report.libraries, &matched) {
                output.warn(format!("Library '{}' was not found on the server", name));
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            output.warn(format!("Could not verify connection: {}. Continuing anyway...", e));
        }
    }
}

fn missing_libraries<'a>(configured: &'a [String], matched: &[media_report_models::LibraryRef]) -> Vec<&'a str> {
    configured
        .iter()
        .filter(|name| !matched.iter().any(|l| &l.section_name == *name))
        .map(String::as_str)
        .collect()
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == PLACEHOLDER_API_KEY {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn check_mark(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn action_display(action: FailureAction) -> &'static str {
    match action {
        FailureAction::Skip => "skip",
        FailureAction::Abort => "abort",
    }
}

fn section_table(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(format!("{} Configuration", title))
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

// Formatting helpers

/// Print a formatted section header
fn print_section_header(title: &str, output: &Output) {
    output.info("");
    output.info(format!("{}", title.bold().bright_cyan()));
    output.info(format!("{}", "─".repeat(title.len()).bright_cyan()));
}

/// Print a numbered instruction list
fn print_instruction_list(items: &[&str], output: &Output) {
    for (idx, item) in items.iter().enumerate() {
        output.info(format!("  {}. {}", idx + 1, item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_report_models::LibraryRef;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string(PLACEHOLDER_API_KEY), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("0123456789abcdef"), "01***ef");
        assert_eq!(mask_string("€€abcdef€"), "€€***f€");
        assert_eq!(mask_string("日本語"), "***");
    }

    #[test]
    fn test_missing_libraries() {
        let configured = vec!["TV Shows".to_string(), "Movies".to_string(), "Anime".to_string()];
        let matched = vec![LibraryRef {
            section_id: "2".to_string(),
            section_name: "Movies".to_string(),
        }];
        assert_eq!(missing_libraries(&configured, &matched), vec!["TV Shows", "Anime"]);
    }

    #[test]
    fn test_action_display() {
        assert_eq!(action_display(FailureAction::Skip), "skip");
        assert_eq!(action_display(FailureAction::Abort), "abort");
    }
}

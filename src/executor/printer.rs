use colored::{Color, Colorize};
use url::Url;

use super::models::RunSummary;

pub fn print_run_summary(summary: &RunSummary) {
    let headline_color = if summary.failures > 0 || summary.server_error > 0 {
        Color::Red
    } else if summary.other > 0 {
        Color::Yellow
    } else {
        Color::Green
    };

    println!(
        "{} {}",
        summary.microservice.bold(),
        format!("[{}]", summary.env).cyan()
    );
    println!(
        "{} {} {} {} {}",
        "Status:".bold(),
        format!("200: {}", summary.ok).green(),
        format!("500: {}", summary.server_error).red(),
        format!("other: {}", summary.other).yellow(),
        format!("failed: {}", summary.failures).color(headline_color)
    );
    println!(
        "{} {}",
        "Total time:".bold(),
        format!("{:.3} s", summary.total_elapsed_secs).dimmed()
    );
    println!(
        "{} {}",
        "Responses:".bold(),
        format_path_link(&summary.files.responses)
    );
    println!(
        "{} {}",
        "Status log:".bold(),
        format_path_link(&summary.files.status)
    );
}

pub fn print_pair_failure(microservice: &str, env: &str, message: &str) {
    println!(
        "{} {} {}",
        microservice.bold(),
        format!("[{env}]").cyan(),
        message.red()
    );
}

fn format_path_link(path: &std::path::Path) -> String {
    let display = path.to_string_lossy();
    match Url::from_file_path(path) {
        Ok(url) => format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, display.cyan()),
        Err(_) => display.cyan().to_string(),
    }
}

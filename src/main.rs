use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use apiprobe::{
    config::{load_settings, HttpOptions, ProbeSettings, DEFAULT_USER_AGENT},
    executor::{print_pair_failure, print_run_summary},
    logging, run_pair, PairRequest,
};
use clap::Parser;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[command(
    name = "apiprobe",
    version,
    about = "Smoke-test runner for deployed HTTP services",
    disable_help_subcommand = true
)]
struct Cli {
    /// Microservices to test (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    microservices: Vec<String>,

    /// Environments to test (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    envs: Vec<String>,

    /// Directory holding .env.<microservice>.<env> files and apiprobe.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding api_list.json / golia_api_list.json
    #[arg(long)]
    catalog_dir: Option<PathBuf>,

    /// Directory to write result files into
    #[arg(long = "output", short = 'O')]
    output: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Override base directory used for resolving paths
    #[arg(long)]
    cwd: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_dir = match cli.cwd.as_ref() {
        Some(path) => resolve_path(path)?,
        None => std::env::current_dir()?,
    };

    logging::init(cli.log_file.as_ref().map(|p| resolve_relative(&base_dir, p)).as_deref())?;

    let config_dir = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());

    let loaded = load_settings(&config_dir).context("loading settings")?;
    let settings = loaded
        .as_ref()
        .map(|l| l.settings.clone())
        .unwrap_or_default();
    let from_settings =
        |value: &Option<String>| value.as_deref().and_then(|v| loaded.as_ref().map(|l| l.resolve(v)));

    let catalog_dir = cli
        .catalog_dir
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .or_else(|| from_settings(&settings.catalog_dir))
        .unwrap_or_else(|| config_dir.clone());
    let results_dir = cli
        .output
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .or_else(|| from_settings(&settings.results_dir))
        .unwrap_or_else(|| base_dir.join("results"));

    let http = http_options(&cli, &settings);
    let microservices = names(&cli.microservices, &settings.microservices);
    let envs = names(&cli.envs, &settings.envs);
    if microservices.is_empty() || envs.is_empty() {
        bail!("nothing to test: pass --microservices and --envs or list them in apiprobe.json");
    }

    let mut failed = 0;
    let total = microservices.len() * envs.len();
    for microservice in &microservices {
        for env in &envs {
            let request = PairRequest {
                microservice: microservice.clone(),
                env: env.clone(),
                config_dir: config_dir.clone(),
                catalog_dir: catalog_dir.clone(),
                results_dir: results_dir.clone(),
                http: http.clone(),
            };

            match run_pair(&request).await {
                Ok(summary) => print_run_summary(&summary),
                Err(err) => {
                    if err.is_configuration() {
                        warn!(%microservice, %env, error = %err, "skipping pair");
                    } else {
                        error!(%microservice, %env, error = %err, "pair aborted");
                    }
                    print_pair_failure(microservice, env, &err.to_string());
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} runs did not complete");
    }
    Ok(())
}

fn http_options(cli: &Cli, settings: &ProbeSettings) -> HttpOptions {
    HttpOptions {
        timeout: cli
            .timeout
            .or(settings.timeout_secs)
            .map(Duration::from_secs),
        accept_invalid_certs: cli.insecure || settings.accept_invalid_certs,
        user_agent: settings
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        default_headers: settings.default_headers.clone(),
    }
}

/// Command-line values win; otherwise fall back to the settings file.
fn names(from_cli: &[String], from_settings: &[String]) -> Vec<String> {
    let source = if from_cli.is_empty() {
        from_settings
    } else {
        from_cli
    };
    source
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    struct DirGuard {
        original: PathBuf,
    }

    impl DirGuard {
        fn new(new_dir: &Path) -> Result<Self> {
            let original = std::env::current_dir()?;
            std::env::set_current_dir(new_dir)?;
            Ok(Self { original })
        }
    }

    impl Drop for DirGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.original);
        }
    }

    #[test]
    fn resolve_path_uses_current_directory() -> Result<()> {
        let temp = tempdir()?;
        let _guard = DirGuard::new(temp.path())?;
        let relative = Path::new("configs");
        std::fs::create_dir_all(temp.path().join(relative))?;
        let resolved = resolve_path(relative)?;
        assert!(resolved.is_absolute());
        assert_eq!(
            resolved.canonicalize()?,
            temp.path().join(relative).canonicalize()?
        );
        Ok(())
    }

    #[test]
    fn resolve_relative_joins_when_needed() {
        let base = Path::new("/tmp/base");
        let relative = Path::new("results");
        assert_eq!(resolve_relative(base, relative), base.join(relative));

        let absolute = Path::new("/var/data/results");
        assert_eq!(resolve_relative(base, absolute), absolute);
    }

    #[test]
    fn names_prefer_cli_and_drop_blanks() {
        let cli = vec!["orders".to_string(), " ".to_string(), " golia ".to_string()];
        let settings = vec!["billing".to_string()];
        assert_eq!(names(&cli, &settings), vec!["orders", "golia"]);
        assert_eq!(names(&[], &settings), vec!["billing"]);
    }

    #[test]
    fn cli_splits_comma_separated_lists() {
        let cli = Cli::parse_from(["apiprobe", "-m", "orders,golia", "--envs", "dev,prod"]);
        assert_eq!(cli.microservices, vec!["orders", "golia"]);
        assert_eq!(cli.envs, vec!["dev", "prod"]);
    }

    #[test]
    fn http_options_merge_cli_and_settings() {
        let cli = Cli::parse_from(["apiprobe", "--timeout", "7"]);
        let settings = ProbeSettings {
            timeout_secs: Some(30),
            accept_invalid_certs: true,
            ..ProbeSettings::default()
        };
        let options = http_options(&cli, &settings);
        assert_eq!(options.timeout, Some(Duration::from_secs(7)));
        assert!(options.accept_invalid_certs);
        assert_eq!(options.user_agent, DEFAULT_USER_AGENT);
    }
}

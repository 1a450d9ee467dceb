//! Candidate screener: rank CVs against a job description with a structured-output LLM

use candidate_screener::cli::{self, Cli, Commands, ConfigAction};
use candidate_screener::config::{Config, FailurePolicy};
use candidate_screener::error::{Result, ScreenerError};
use candidate_screener::input::InputManager;
use candidate_screener::llm::analyzer::{RetryPolicy, ScreeningClient};
use candidate_screener::llm::inference::LlmBackend;
use candidate_screener::output::report::save_report;
use candidate_screener::output::ReportGenerator;
use candidate_screener::processing::batch::{BatchOrchestrator, CancelFlag};
use candidate_screener::processing::document::JobDescription;
use candidate_screener::processing::schema::response_json_schema;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let (mut logger, dotenv_error) = logging_builder(None, env_logger::DEFAULT_FILTER_ENV, cli.verbose);
    logger.init();

    if let Some(e) = dotenv_error {
        warn!("Ignoring unreadable .env file: {}", e);
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    if let Err(e) = run_command(cli.command, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

/// Loads `.env` (or `env_file`) first so the log filter variable may come from it.
fn logging_builder(
    env_file: Option<&Path>,
    filter_var: &str,
    verbose: bool,
) -> (env_logger::Builder, Option<dotenvy::Error>) {
    let loaded = match env_file {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    let dotenv_error = loaded.err().filter(|e| !e.not_found());

    let log_level = if verbose { "debug" } else { "info" };
    let builder = env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or(filter_var, log_level)
            .write_style(env_logger::DEFAULT_WRITE_STYLE_ENV),
    );
    (builder, dotenv_error)
}

async fn run_command(command: Commands, config_path: &Path) -> Result<()> {
    match command {
        Commands::Screen {
            resumes,
            job,
            job_text,
            provider,
            model,
            output,
            export,
            flag_failures,
            detailed,
        } => {
            let mut config = Config::load_from(config_path)?;
            if let Some(provider) = provider {
                let provider = cli::parse_provider(&provider).map_err(ScreenerError::InvalidInput)?;
                config.llm.switch_provider(provider);
            }
            if let Some(model) = model {
                config.llm.model = model;
            }
            if flag_failures {
                config.screening.failure_policy = FailurePolicy::Flag;
            }
            let output_format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(ScreenerError::InvalidInput)?,
                None => config.output.format,
            };

            let input_manager = InputManager::new();
            let job = resolve_job_description(&input_manager, job, job_text, &config).await?;
            let documents = input_manager.load_candidates(&resumes).await?;

            info!(
                "Screening {} CV(s) with {} ({:?})",
                documents.len(),
                config.llm.model,
                config.llm.provider
            );

            let backend = LlmBackend::from_config(&config.llm)?;
            let client = ScreeningClient::new(backend).with_retry(RetryPolicy::from_config(&config.llm));

            let cancel = CancelFlag::new();
            let orchestrator = BatchOrchestrator::new(client)
                .with_failure_policy(config.screening.failure_policy)
                .with_cancel_flag(cancel.clone());

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                eprintln!("\n⏹  Cancelling after the current document (Ctrl-C again to abort)...");
                cancel.cancel();

                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\n⏹  Aborted");
                    process::exit(130);
                }
            });

            let progress = ProgressBar::new(documents.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );

            let result = orchestrator
                .run(&job, &documents, |update| {
                    progress.set_position(update.processed as u64);
                    progress.set_message(update.current.to_string());
                })
                .await;
            progress.finish_and_clear();
            result.ensure_screened()?;

            let generator = ReportGenerator::with_options(
                config.output.color_output,
                detailed || config.output.detailed,
            );
            println!("{}", generator.generate_report(&result, &output_format)?);

            if let Some(target) = export {
                let path = save_report(&result.records, &target)?;
                println!("📁 Report saved to {}", path.display());
            }
        }

        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&response_json_schema())?);
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let config = Config::load_from(config_path)?;
                println!("⚙️  Current Configuration ({})\n", config_path.display());
                println!("Provider: {:?}", config.llm.provider);
                println!("Endpoint: {}", config.llm.base_url);
                println!("Model: {}", config.llm.model);
                println!("API key variable: {}", config.llm.api_key_env);
                println!("Timeout: {}s, retries: {}", config.llm.timeout_secs, config.llm.max_retries);
                println!(
                    "Default job description: {}",
                    config
                        .screening
                        .default_job_description
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(none)".to_string())
                );
                println!("Failure policy: {:?}", config.screening.failure_policy);
                println!("Output format: {:?}", config.output.format);
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save_to(config_path)?;
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}

/// Inline text wins over a file, which wins over the configured default.
async fn resolve_job_description(
    input_manager: &InputManager,
    job: Option<PathBuf>,
    job_text: Option<String>,
    config: &Config,
) -> Result<JobDescription> {
    if let Some(text) = job_text {
        return JobDescription::new(text, "inline");
    }

    let path = job
        .or_else(|| config.screening.default_job_description.clone())
        .ok_or_else(|| ScreenerError::InvalidInput(
            "No job description: pass --job, --job-text or set screening.default_job_description".to_string()
        ))?;

    cli::validate_file_extension(&path, &["pdf", "txt", "md"])
        .map_err(|e| ScreenerError::InvalidInput(format!("Job description file: {}", e)))?;

    input_manager.load_job_description(&path).await
}

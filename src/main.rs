use clap::Parser;
use log::LevelFilter;
use phishguard::bot::{self, BotDeps};
use phishguard::{Config, DomainAgeChecker, FeatureExtractor, PhishingModel};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use teloxide::Bot;

#[derive(Parser, Debug)]
#[command(name = "phishguard-bot", version, about = "Telegram bot that flags phishing URLs")]
struct Args {
    /// Configuration file (YAML); defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the model path from the config
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Use canned WHOIS data instead of live lookups
    #[arg(long)]
    mock_whois: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading configuration: {e:#}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(model_path) = &args.model {
        config.model_path = model_path.display().to_string();
    }
    if args.mock_whois {
        config.whois.use_mock = true;
    }

    let token = match std::env::var("BOT_TOKEN") {
        Ok(token) if !token.is_empty() => token,
        _ => {
            eprintln!("Error: BOT_TOKEN environment variable is not set");
            process::exit(1);
        }
    };

    let model = match PhishingModel::load(&config.model_path) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error loading model: {e:#}");
            process::exit(1);
        }
    };

    let checker = DomainAgeChecker::new(config.whois.timeout_seconds, config.whois.use_mock);
    let deps = Arc::new(BotDeps {
        model,
        extractor: FeatureExtractor::new(checker),
    });

    log::info!("phishguard bot starting (model: {})", config.model_path);
    bot::run(Bot::new(token), deps).await;
}

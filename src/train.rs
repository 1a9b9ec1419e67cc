use clap::Parser;
use log::LevelFilter;
use phishguard::trainer;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "phishguard-train",
    version,
    about = "Fit the phishing classifier from a labeled CSV dataset"
)]
struct Args {
    /// Labeled dataset with a 'class' column
    #[arg(short, long, default_value = "phishing.csv")]
    dataset: PathBuf,

    /// Where to write the fitted model
    #[arg(short, long, default_value = "phishing_model.json")]
    output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    match trainer::run(&args.dataset, &args.output) {
        Ok(report) => {
            println!("Accuracy: {:.4}", report.accuracy);
            println!(
                "Trained on {} rows, evaluated on {} held-out rows",
                report.train_examples, report.test_examples
            );
            println!("Model saved to {}", args.output.display());
        }
        Err(e) => {
            eprintln!("Training failed: {e:#}");
            process::exit(1);
        }
    }
}

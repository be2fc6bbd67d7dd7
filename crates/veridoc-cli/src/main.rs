mod demo;

use clap::{Parser, Subcommand};
use veridoc_core::{classify, normalize_cid, parse_amount, ThresholdConfig};

#[derive(Parser)]
#[command(name = "veridoc", version, about = "Medical-document verification workflow")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a trust score into a routing bucket.
    Classify {
        score: f64,
        #[arg(long)]
        reject: Option<f64>,
        #[arg(long)]
        manual: Option<f64>,
        #[arg(long)]
        auto: Option<f64>,
    },
    /// Normalise a document locator into a bare content identifier.
    Normalize { locator: String },
    /// Run the full verification workflow against the in-process chain.
    Demo {
        /// Required validator quorum.
        #[arg(long, default_value_t = 2)]
        validators: u32,
        /// Validator reward pool in tokens.
        #[arg(long, default_value = "2.0")]
        reward: String,
        /// Fixed issuer bonus in tokens.
        #[arg(long, default_value = "0.01")]
        bonus: String,
        /// AI trust score for the demo claim.
        #[arg(long, default_value_t = 45.0)]
        score: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Classify {
            score,
            reject,
            manual,
            auto,
        } => {
            let config = ThresholdConfig {
                rejection_threshold: reject,
                manual_review_threshold: manual,
                auto_approval_threshold: auto,
            };
            let bucket = classify(score, &config)?;
            println!("{}", bucket.as_str());
        }
        Command::Normalize { locator } => {
            println!("{}", normalize_cid(&locator));
        }
        Command::Demo {
            validators,
            reward,
            bonus,
            score,
        } => {
            demo::run(validators, parse_amount(&reward)?, parse_amount(&bonus)?, score).await?;
        }
    }
    Ok(())
}

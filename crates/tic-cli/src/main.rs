//! `tic`: a demo/ops binary over the Threat Intelligence Core library
//! boundary. Not a server — every subcommand brings `TicCore` up, runs one
//! operation, flushes it back down. Useful for smoke-testing a cache
//! directory, replaying a single message/URL/number through the
//! aggregator, or driving feedback and reputation changes from a script.
//!
//! # Usage
//!
//! ```bash
//! tic analyze-text "URGENT: verify your OTP" --sender +15551234567
//! tic analyze-url https://paypal-verify.tk/login
//! tic report-phone +15551234567 scam
//! tic refresh-feeds
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tic_common::TicConfig;
use tic_risk::{ReportChoice, TicCore};

#[derive(Parser)]
#[command(name = "tic")]
#[command(about = "Threat Intelligence Core demo/ops CLI", long_about = None)]
struct Cli {
    /// Directory backing the URL cache, pattern weights, and community
    /// report file.
    #[arg(long, env = "TIC_CACHE_DIR", default_value = "./tic-data")]
    cache_dir: PathBuf,

    /// SQLite file backing the phone/domain reputation stores.
    #[arg(long, env = "TIC_DB_PATH", default_value = "./tic-data/reputation.sqlite3")]
    db_path: PathBuf,

    /// Print the full `RiskResult` as JSON instead of a one-line summary.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a text message.
    AnalyzeText {
        text: String,
        #[arg(long, default_value = "sms")]
        source: String,
        #[arg(long)]
        sender: Option<String>,
    },
    /// Score a single URL.
    AnalyzeUrl { url: String },
    /// Score a phone number.
    AnalyzePhone {
        number: String,
        #[arg(long)]
        incoming: bool,
    },
    /// Score a precomputed video-call deepfake signal.
    AnalyzeVideo {
        face_consistency: f32,
        temporal_anomalies: u32,
        lip_sync_error: f32,
    },
    /// Score a precomputed file-scan result (no indicators attached).
    AnalyzeFile {
        #[arg(long)]
        infected: bool,
        #[arg(long)]
        threat_name: Option<String>,
    },
    /// Send a user verdict on a previously analyzed content hash to the
    /// adaptive-learning engine.
    Feedback {
        content_hash: String,
        #[arg(long)]
        detected: bool,
        #[arg(long)]
        confirmed: bool,
    },
    /// Pull the phishing/malware feeds and atomically swap the URL cache.
    RefreshFeeds {
        /// API key for the malware-payload feed; omitted disables it.
        #[arg(long, env = "TIC_URLHAUS_AUTH_KEY")]
        urlhaus_auth_key: Option<String>,
    },
    /// Record a scam/safe report against a phone number's trust counter.
    ReportPhone { number: String, verdict: Verdict },
    /// Record a scam/safe report against a domain's trust counter.
    ReportDomain {
        domain: String,
        verdict: Verdict,
        #[arg(long)]
        category: Option<String>,
    },
    /// Block a phone number outright.
    BlockPhone { number: String },
    /// Block a domain outright.
    BlockDomain { domain: String },
    /// Look up what the community store knows about a phone number.
    CheckPhone { number: String },
    /// Look up what the community store knows about a domain.
    CheckDomain { domain: String },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Verdict {
    Scam,
    Safe,
}

impl From<Verdict> for ReportChoice {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Scam => ReportChoice::Scam,
            Verdict::Safe => ReportChoice::Safe,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), tic_risk::TicError> {
    std::fs::create_dir_all(&cli.cache_dir).map_err(|e| tic_common::StoreError::Io(e.to_string()))?;
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&format!("sqlite://{}?mode=rwc", cli.db_path.display()))
        .await
        .map_err(|e| tic_common::StoreError::Io(e.to_string()))?;

    let core = TicCore::init(TicConfig::from_env(), cli.cache_dir.clone(), pool).await?;
    let json = cli.json;

    match cli.command {
        Commands::AnalyzeText { text, source, sender } => {
            let result = core.analyze_text(&text, &source, sender.as_deref()).await;
            print_result(&result, json);
        }
        Commands::AnalyzeUrl { url } => {
            let result = core.analyze_url(&url).await;
            print_result(&result, json);
        }
        Commands::AnalyzePhone { number, incoming } => {
            let result = core.analyze_phone(&number, incoming).await;
            print_result(&result, json);
        }
        Commands::AnalyzeVideo { face_consistency, temporal_anomalies, lip_sync_error } => {
            let result = core.analyze_video_signals(face_consistency, temporal_anomalies, lip_sync_error);
            print_result(&result, json);
        }
        Commands::AnalyzeFile { infected, threat_name } => {
            let signal = tic_common::FileScanSignal {
                infected,
                threat_name,
                indicators: Vec::new(),
            };
            let result = core.analyze_file_signal(&signal);
            print_result(&result, json);
        }
        Commands::Feedback { content_hash, detected, confirmed } => {
            core.record_feedback(&content_hash, detected, confirmed);
            println!("feedback recorded for {content_hash}");
        }
        Commands::RefreshFeeds { urlhaus_auth_key } => {
            let stats = core.refresh_url_cache(urlhaus_auth_key).await;
            println!(
                "phishing={} malware={} errors={:?}",
                stats.phishing_count, stats.malware_count, stats.errors
            );
        }
        Commands::ReportPhone { number, verdict } => {
            core.report_phone(&number, verdict.into()).await?;
            println!("recorded {number}");
        }
        Commands::ReportDomain { domain, verdict, category } => {
            core.report_domain(&domain, verdict.into(), category.as_deref()).await?;
            println!("recorded {domain}");
        }
        Commands::BlockPhone { number } => {
            core.block_phone(&number).await?;
            println!("blocked {number}");
        }
        Commands::BlockDomain { domain } => {
            core.block_domain(&domain).await?;
            println!("blocked {domain}");
        }
        Commands::CheckPhone { number } => match core.check_phone(&number) {
            Some(report) => println!("severity={} reports={} evidence={}", report.severity, report.report_count, report.evidence),
            None => println!("no community report on file"),
        },
        Commands::CheckDomain { domain } => match core.check_domain(&domain) {
            Some(report) => println!("severity={} reports={} evidence={}", report.severity, report.report_count, report.evidence),
            None => println!("no community report on file"),
        },
    }

    core.shutdown()?;
    Ok(())
}

fn print_result(result: &tic_common::RiskResult, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(result).unwrap());
    } else {
        println!(
            "score={} severity={:?} confidence={:.2} actions={:?}\n{}",
            result.score, result.severity, result.confidence, result.recommended_actions, result.explain_plain
        );
        for reason in &result.reasons {
            println!("  - [{:?}] {} ({})", reason.kind, reason.title, reason.evidence);
        }
    }
}

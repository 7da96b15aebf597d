//! catrack-ai - Field Inspection AI Client
//!
//! Command-line access to the CATrack extraction service: submit one
//! inspection item, record evidence for later compilation, compile a whole
//! session into a verdict, probe service health, transcribe a voice note,
//! or synthesize the final report from a reviewed result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use catrack_ai::config::resolve_client_config;
use catrack_ai::db::{self, EvidenceStore, SqliteEvidenceStore};
use catrack_ai::services::ExtractionClient;
use catrack_ai::types::{ExtractionResult, InspectionCategory, ItemStatus, Severity};
use catrack_ai::workflow::InspectionSession;

#[derive(Parser)]
#[command(name = "catrack-ai", version, about = "CATrack field inspection AI client")]
struct Cli {
    /// Inference service base URL (overrides CATRACK_API_URL and config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit one inspection item (voice note plus optional photo)
    Submit {
        /// Path to the recorded voice note
        audio: PathBuf,
        /// Path to the component photo
        #[arg(long)]
        image: Option<PathBuf>,
        /// Component category; "auto" defers to the service-side classifier
        #[arg(long, default_value = "auto")]
        category: InspectionCategory,
        /// Tracking tag echoed back by the service
        #[arg(long)]
        job_id: Option<String>,
    },
    /// Record evidence for an item without submitting it yet
    Record {
        /// Session this item belongs to
        #[arg(long)]
        session: Uuid,
        /// Item identifier; generated when omitted
        #[arg(long)]
        item: Option<Uuid>,
        /// Path to the recorded voice note
        audio: PathBuf,
        /// Path to the component photo
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Submit every recorded item in a session and print the verdict
    Compile {
        #[arg(long)]
        session: Uuid,
        #[arg(long, default_value = "auto")]
        category: InspectionCategory,
    },
    /// Discard all recorded evidence for a session
    Clear {
        #[arg(long)]
        session: Uuid,
    },
    /// Probe service liveness and adapter availability
    Health,
    /// Transcribe a voice note without running extraction
    Transcribe {
        audio: PathBuf,
    },
    /// Generate the final report from a reviewed result file
    Report {
        result: PathBuf,
        #[arg(long)]
        job_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = resolve_client_config(cli.api_url.as_deref());
    info!("Service URL: {}", config.api_url);

    let client = ExtractionClient::new(&config)?;

    match cli.command {
        Command::Submit {
            audio,
            image,
            category,
            job_id,
        } => {
            let image_ref = image.as_ref().map(|p| p.to_string_lossy());
            let result = client
                .run_inspection(
                    &audio.to_string_lossy(),
                    image_ref.as_deref(),
                    job_id.as_deref(),
                    category,
                )
                .await?;

            print_result(&result);
            save_result(&audio, &result)?;
        }
        Command::Record {
            session,
            item,
            audio,
            image,
        } => {
            let store = open_store().await?;
            let item_id = item.unwrap_or_else(Uuid::new_v4);
            store
                .put(
                    session,
                    item_id,
                    &audio.to_string_lossy(),
                    image.as_ref().map(|p| p.to_string_lossy()).as_deref(),
                )
                .await?;
            println!("Recorded item {} in session {}", item_id, session);
        }
        Command::Compile { session, category } => {
            let store = open_store().await?;
            let inspection = InspectionSession::new(session, Arc::new(client));
            let outcome = inspection.compile(&store, category).await?;

            for result in inspection.results().await {
                print_result(&result);
            }
            for (item_id, err) in &outcome.failures {
                println!("  [FAILED] item {} -- {}", item_id, err);
            }

            let verdict = outcome.verdict;
            println!("Preliminary status: {}", verdict.preliminary_status);
            println!("Critical override:  {}", verdict.has_critical_override);
            println!("Review required:    {}", verdict.technician_review_required);
        }
        Command::Clear { session } => {
            let store = open_store().await?;
            store.clear(session).await?;
            println!("Cleared session {}", session);
        }
        Command::Health => {
            let health = client.health().await?;
            println!("status:            {}", health.status);
            println!("adapter_available: {}", health.adapter_available);
            println!("healthy:           {}", health.is_healthy());
        }
        Command::Transcribe { audio } => {
            let audio_b64 = catrack_ai::encoder::encode_audio(&audio.to_string_lossy()).await?;
            let transcript = client.transcribe(&audio_b64).await?;
            println!("{}", transcript);
        }
        Command::Report { result, job_id } => {
            let content = std::fs::read_to_string(&result)
                .with_context(|| format!("reading {}", result.display()))?;
            let verified: serde_json::Value =
                serde_json::from_str(&content).context("result file is not valid JSON")?;

            let report = client.synthesize(&verified, job_id.as_deref()).await?;
            println!("{}", report.report);
        }
    }

    Ok(())
}

/// Open the evidence store in the resolved data folder.
async fn open_store() -> Result<SqliteEvidenceStore> {
    let toml_config = catrack_common::config::load_toml_config().unwrap_or_default();
    let default_folder = catrack_common::config::default_data_folder();
    let folder = catrack_common::config::resolve_setting(
        None,
        "CATRACK_DATA_FOLDER",
        toml_config.data_folder.as_deref(),
        &default_folder.to_string_lossy(),
    );

    let pool = db::init_database_pool(&PathBuf::from(folder).join("catrack.db")).await?;
    Ok(SqliteEvidenceStore::new(pool))
}

/// Print a human-readable summary of one item's result.
fn print_result(result: &ExtractionResult) {
    let status_tag = match result.summary.status {
        ItemStatus::Pass => "[PASS]",
        ItemStatus::Monitor => "[MONITOR]",
        ItemStatus::Fail => "[FAIL]",
    };

    println!("\n{}", "=".repeat(55));
    println!("  {} {}", status_tag, result.summary.asset);
    println!("  {}", result.summary.operational_impact);

    if result.anomalies.is_empty() {
        println!("  No anomalies.");
    } else {
        println!("\n  Anomalies ({}):", result.anomalies.len());
        for anomaly in &result.anomalies {
            let severity_tag = match anomaly.severity {
                Severity::Critical => "[CRIT]",
                Severity::Moderate => "[MOD]",
                Severity::Low => "[LOW]",
            };
            let review = if anomaly.technician_review_required {
                "  (review required)"
            } else {
                ""
            };
            println!(
                "    {} {} -- {}{}",
                severity_tag, anomaly.component, anomaly.recommended_action, review
            );
        }
    }
    println!("{}\n", "=".repeat(55));
}

/// Save the raw result JSON next to the input recording.
fn save_result(audio: &Path, result: &ExtractionResult) -> Result<()> {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "inspection".to_string());
    let out = audio.with_file_name(format!("{}_report.json", stem));

    std::fs::write(&out, serde_json::to_string_pretty(result)?)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("Saved -> {}", out.display());

    Ok(())
}

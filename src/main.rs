use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use concord::{
    assign_display_names, consolidate_speakers, ConcordError, FilePendingStore, JsonMeetingPool,
    MatchConfig, MatchDecision, MeetingContext, MeetingRecord, Reconciler, SessionType,
};

#[derive(Parser)]
#[command(name = "concord")]
#[command(author, version, about = "Meeting summary and transcript reconciliation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidate meetings for one pending summary
    Candidates {
        /// Directory of pending summary records (one JSON file each)
        #[arg(short, long)]
        pending_dir: PathBuf,

        /// JSON file holding the meeting pool
        #[arg(short, long)]
        meetings: PathBuf,

        /// Pending record id
        #[arg(long)]
        id: String,

        /// Matching configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Reconcile every pending summary that has a confident match
    Auto {
        /// Directory of pending summary records (one JSON file each)
        #[arg(short, long)]
        pending_dir: PathBuf,

        /// JSON file holding the meeting pool
        #[arg(short, long)]
        meetings: PathBuf,

        /// Matching configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Manually reconcile one pending summary to a chosen meeting
    Pick {
        /// Directory of pending summary records (one JSON file each)
        #[arg(short, long)]
        pending_dir: PathBuf,

        /// JSON file holding the meeting pool
        #[arg(short, long)]
        meetings: PathBuf,

        /// Pending record id
        #[arg(long)]
        id: String,

        /// Meeting id to commit
        #[arg(long)]
        meeting_id: String,

        /// Matching configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Merge spuriously split speaker identities in a meeting record
    Consolidate {
        /// Input meeting record (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the consolidated record (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Session type tag, e.g. "1-on-1" (inferred from the title when omitted)
        #[arg(long)]
        session_type: Option<String>,

        /// Known participant names, comma separated
        #[arg(long)]
        known_names: Option<String>,

        /// Matching configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print per-pair similarity scores
        #[arg(long)]
        show_pairs: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Candidates {
            pending_dir,
            meetings,
            id,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            candidates(&pending_dir, &meetings, &id, config.as_deref())
        }
        Commands::Auto {
            pending_dir,
            meetings,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            auto(&pending_dir, &meetings, config.as_deref())
        }
        Commands::Pick {
            pending_dir,
            meetings,
            id,
            meeting_id,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            pick(&pending_dir, &meetings, &id, &meeting_id, config.as_deref())
        }
        Commands::Consolidate {
            input,
            output,
            session_type,
            known_names,
            config,
            show_pairs,
            verbose,
        } => {
            setup_logging(verbose);
            consolidate(
                &input,
                &output,
                session_type.as_deref(),
                known_names.as_deref(),
                config.as_deref(),
                show_pairs,
            )
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&Path>) -> Result<MatchConfig> {
    match path {
        Some(p) => {
            MatchConfig::from_file(p).with_context(|| format!("Failed to load config: {:?}", p))
        }
        None => Ok(MatchConfig::default()),
    }
}

fn candidates(pending_dir: &Path, meetings: &Path, id: &str, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let store = FilePendingStore::new(pending_dir);
    let pool = JsonMeetingPool::from_file(meetings)?;
    let reconciler = Reconciler::new(config);

    let decision = reconciler.candidates_for(&store, &pool, id)?;
    match &decision {
        MatchDecision::NoCandidates => {
            println!("No candidate meetings in the search window");
        }
        MatchDecision::Confident { best, ranked } => {
            info!(best = %best.meeting_id, score = best.score, "confident match available");
            println!("{}", serde_json::to_string_pretty(ranked)?);
        }
        MatchDecision::BelowThreshold { ranked } => {
            info!("no candidate above the session threshold");
            println!("{}", serde_json::to_string_pretty(ranked)?);
        }
    }
    Ok(())
}

fn auto(pending_dir: &Path, meetings: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let store = FilePendingStore::new(pending_dir);
    let pool = JsonMeetingPool::from_file(meetings)?;
    info!(meetings = pool.len(), "loaded meeting pool");
    let reconciler = Reconciler::new(config);

    let report = reconciler.auto_reconcile(&store, &pool)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn pick(
    pending_dir: &Path,
    meetings: &Path,
    id: &str,
    meeting_id: &str,
    config: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let store = FilePendingStore::new(pending_dir);
    let pool = JsonMeetingPool::from_file(meetings)?;
    let reconciler = Reconciler::new(config);

    match reconciler.manual_reconcile(&store, &pool, id, meeting_id) {
        Ok(result) => {
            println!(
                "{}",
                serde_json::json!({
                    "ok": true,
                    "matched_meeting_id": result.matched_meeting_id,
                    "title": result.title,
                })
            );
            Ok(())
        }
        // Domain failures leave the record pending and report why; only
        // store/source failures propagate as process errors.
        Err(
            e @ (ConcordError::UnknownMeeting { .. }
            | ConcordError::InvalidMeetingId { .. }
            | ConcordError::AlreadyReconciled { .. }
            | ConcordError::UnknownPending { .. }),
        ) => {
            println!(
                "{}",
                serde_json::json!({ "ok": false, "error": e.display_reason() })
            );
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn consolidate(
    input: &Path,
    output: &Path,
    session_type: Option<&str>,
    known_names: Option<&str>,
    config: Option<&Path>,
    show_pairs: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read meeting record: {:?}", input))?;
    let mut meeting: MeetingRecord =
        serde_json::from_str(&content).context("Failed to parse meeting record")?;

    let session_type = match session_type {
        Some(tag) => SessionType::from_tag(tag),
        None => SessionType::infer_from_title(&meeting.title),
    };
    let known_names: Vec<String> = known_names
        .map(|s| {
            s.split(',')
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let context = MeetingContext {
        title: Some(meeting.title.clone()),
        session_type,
        known_names,
    };
    let result = consolidate_speakers(&meeting.blocks, &context, &config);

    info!(
        merges = result.merges,
        identities = result.mapping.len(),
        threshold = result.effective_threshold,
        "consolidation complete"
    );
    if show_pairs {
        println!("{}", serde_json::to_string_pretty(&result.pair_scores)?);
    }

    meeting.blocks = result.blocks;

    // Replace surviving identities with display names
    let display = assign_display_names(&meeting.blocks, &context.known_names, &config);
    for block in &mut meeting.blocks {
        if let Some(name) = display.get(&block.speaker_id) {
            block.speaker_id = name.clone();
        }
    }

    let json = serde_json::to_string_pretty(&meeting)?;
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write output: {:?}", output))?;
    info!("Output written to {:?}", output);
    Ok(())
}

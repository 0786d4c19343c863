use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use draftline_core::{
    AppConfig, Document, Editor,
    assembly::{assemble, load_plan},
    bootstrap::create_new_project,
    diagnostics::init_tracing,
    persistence::{DRAFT_CONTENT_FILE, backup_draft, load_draft},
    probe::MediaProber,
    time::timeline_duration,
};

#[derive(Debug, Parser)]
#[command(name = "draftline-cli")]
#[command(about = "Headless tools for building and checking video editor drafts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overrides the configured log directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Explicit config file instead of discovery.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Frame-compensated timeline duration for a length in seconds.
    Metrics {
        seconds: f64,

        #[arg(long)]
        fps: Option<u32>,
    },
    /// Print the typed metadata of a media file as JSON.
    Probe { path: PathBuf },
    /// Copy the template into a new project folder.
    New {
        #[arg(long)]
        draft_root: Option<PathBuf>,

        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Fill a draft from an assembly plan and save it.
    Assemble {
        plan: PathBuf,

        /// Existing draft_content.json; a new project is created when omitted.
        #[arg(long)]
        draft: Option<PathBuf>,

        /// Keep a timestamped copy of the draft before overwriting it.
        #[arg(long)]
        backup: bool,
    },
    /// Report dangling references and durations of a draft.
    Validate { draft: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load_or_default()?,
    };
    let diagnostics = match cli.log_dir {
        Some(log_dir) => config.diagnostics.clone().with_log_dir(log_dir),
        None => config.diagnostics.clone(),
    };
    let _telemetry = init_tracing(&diagnostics)?;

    match cli.command {
        Commands::Metrics { seconds, fps } => {
            let metrics = timeline_duration(seconds, fps.unwrap_or(config.timeline.fps))?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Commands::Probe { path } => {
            let media = config.prober().probe(&path)?;
            println!("{}", serde_json::to_string_pretty(&media)?);
        }
        Commands::New {
            draft_root,
            template,
        } => {
            let handle = create_new_project(
                &draft_root.unwrap_or_else(|| config.project.draft_root.clone()),
                &template.unwrap_or_else(|| config.project.template_dir.clone()),
            )?;
            println!("{}", serde_json::to_string_pretty(&handle)?);
        }
        Commands::Assemble {
            plan,
            draft,
            backup,
        } => {
            let draft_path = match draft {
                Some(path) => path,
                None => {
                    create_new_project(&config.project.draft_root, &config.project.template_dir)?
                        .draft_content_path
                }
            };
            if backup {
                backup_draft(&draft_path)?;
            }

            let loaded = load_plan(&plan)?;
            let mut editor = Editor::open(&draft_path, config.prober(), config.editor_options())?;
            let report = assemble(&mut editor, &loaded, plan_base_dir(&plan))?;
            editor.save(&draft_path)?;
            tracing::info!(path = %draft_path.display(), "draft assembled");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Validate { draft } => {
            let path = if draft.is_dir() {
                draft.join(DRAFT_CONTENT_FILE)
            } else {
                draft
            };
            let document = Document::from_draft(load_draft(&path)?, config.timeline.fps)?;
            let dangling = document.dangling_references();
            let summary = serde_json::json!({
                "id": document.id(),
                "declared_duration": document.duration(),
                "timeline_duration": document.timeline().total_duration(),
                "tracks": document.timeline().tracks().len(),
                "dangling_references": &dangling,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if !dangling.is_empty() {
                anyhow::bail!("{} dangling references", dangling.len());
            }
        }
    }

    Ok(())
}

fn plan_base_dir(plan: &Path) -> &Path {
    plan.parent().unwrap_or_else(|| Path::new("."))
}

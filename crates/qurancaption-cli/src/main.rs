//! QuranCaption command-line front end
//!
//! Headless access to saved projects: create, inspect, validate, export
//! subtitles and compute verse ranges.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use qurancaption_lib::core::captions::{
    export_subtitle_file, CancelToken, Exportation, SubtitleExportRequest, SubtitleFormat,
    TextSource,
};
use qurancaption_lib::core::class_registry::initialize_class_registry;
use qurancaption_lib::core::ids::random_id;
use qurancaption_lib::core::project::{FileProjectStorage, LoadedProject, Project, ProjectService};
use qurancaption_lib::core::serialization::{ClassRegistry, SerializationEngine};
use qurancaption_lib::core::settings::{default_app_dir, AppSettings, SettingsManager};
use qurancaption_lib::core::values::VerseRange;
use qurancaption_lib::core::{ProjectId, TimeMs, TimeRange};
use qurancaption_lib::init_logging;

#[derive(Parser)]
#[command(name = "qurancaption")]
#[command(about = "Inspect, validate and export QuranCaption projects", long_about = None)]
struct Cli {
    /// Directory holding settings.json (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Directory whose `projects/` folder holds the project files
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Also write a daily log file into this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty project with the default tracks
    New {
        name: String,

        #[arg(long, default_value = "not set")]
        reciter: String,
    },

    /// List saved projects, most recently updated first
    List,

    /// Print a project's details and tracks
    Inspect {
        /// Project id, or path to a project file
        project: String,

        /// Print the project detail as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check every track for ordering, overlap and duration violations
    Validate {
        /// Project id, or path to a project file
        project: String,
    },

    /// Write the subtitle track as an SRT or VTT file
    ExportSubtitles {
        /// Project id, or path to a project file
        project: String,

        /// srt or vtt (defaults to the settings)
        #[arg(long)]
        format: Option<SubtitleFormat>,

        /// `arabic` or a translation key; repeat for several lines per block
        #[arg(long = "language", value_name = "TARGET")]
        languages: Vec<String>,

        /// Window start in milliseconds
        #[arg(long)]
        start: Option<TimeMs>,

        /// Window end in milliseconds
        #[arg(long)]
        end: Option<TimeMs>,

        /// Output file (defaults to the generated export name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the verses covered by a time window
    VerseRange {
        /// Project id, or path to a project file
        project: String,

        #[arg(long)]
        start: Option<TimeMs>,

        #[arg(long)]
        end: Option<TimeMs>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Settings plus the resolved storage root
struct Workspace {
    settings: AppSettings,
    storage_root: PathBuf,
    registry: ClassRegistry,
}

impl Workspace {
    fn load(cli: &Cli) -> Result<Self> {
        let app_dir = match &cli.config_dir {
            Some(dir) => dir.clone(),
            None => default_app_dir().context("No platform config directory")?,
        };
        let settings = SettingsManager::new(app_dir.clone()).load();
        let storage_root = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => settings.storage_root(&app_dir),
        };
        Ok(Self {
            settings,
            storage_root,
            registry: initialize_class_registry(),
        })
    }

    fn service(&self) -> ProjectService<'_> {
        let storage = FileProjectStorage::new(self.storage_root.clone());
        ProjectService::new(Arc::new(storage), &self.registry)
            .with_policy(self.settings.serialization.unknown_tag_policy)
            .with_pretty(self.settings.serialization.pretty_print)
    }

    /// Loads `reference` as a project id, or else as a file path.
    async fn load_project(&self, reference: &str) -> Result<LoadedProject> {
        if let Ok(id) = reference.parse::<ProjectId>() {
            return self
                .service()
                .load_with_diagnostics(id)
                .await
                .with_context(|| format!("Failed to load project {}", id));
        }

        let text = tokio::fs::read_to_string(reference)
            .await
            .with_context(|| format!("Failed to read {}", reference))?;
        let engine = SerializationEngine::new(&self.registry)
            .with_policy(self.settings.serialization.unknown_tag_policy);
        let project = engine
            .from_json_str::<Project>(&text)
            .with_context(|| format!("Failed to parse {}", reference))?;
        Ok(LoadedProject {
            project,
            diagnostics: engine.take_diagnostics(),
        })
    }
}

fn window(project: &Project, start: Option<TimeMs>, end: Option<TimeMs>) -> Option<TimeRange> {
    if start.is_none() && end.is_none() {
        return None;
    }
    let end = end.unwrap_or_else(|| project.content.timeline.longest_track_duration().ms());
    Some(TimeRange::new(start.unwrap_or(0), end))
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Workspace::load(&cli)?;

    match cli.command {
        Commands::New { name, reciter } => {
            let mut project = Project::new(&name, &reciter)?;
            ctx.service().save(&mut project).await?;
            println!("{}", project.id());
        }

        Commands::List => {
            for detail in ctx.service().list().await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}%",
                    detail.id,
                    detail.name,
                    detail.reciter,
                    detail.updated_at.format("%Y-%m-%d %H:%M"),
                    detail.percentage_captioned
                );
            }
        }

        Commands::Inspect { project, json } => {
            let loaded = ctx.load_project(&project).await?;
            let project = loaded.project;
            if json {
                let engine = SerializationEngine::new(&ctx.registry);
                println!("{}", engine.to_json_string(&project.detail, true)?);
                return Ok(());
            }

            let detail = &project.detail;
            println!("{} ({})", detail.name, detail.id);
            println!("  reciter:    {}", detail.reciter);
            println!("  status:     {}", detail.status.status);
            println!("  duration:   {}", detail.duration.formatted_time(false));
            println!("  verses:     {}", detail.verse_range);
            println!("  captioned:  {}%", detail.percentage_captioned);
            for (language, percentage) in &detail.translations {
                println!("  translated: {} {}%", language, percentage);
            }
            println!("  assets:     {}", project.content.assets.len());
            for track in &project.content.timeline.tracks {
                println!(
                    "  track {:<9} {} clip(s), {}",
                    track.name(),
                    track.len(),
                    track.duration().formatted_time(false)
                );
            }
            if !loaded.diagnostics.is_empty() {
                println!("  degraded nodes: {}", loaded.diagnostics.len());
            }
        }

        Commands::Validate { project } => {
            let loaded = ctx.load_project(&project).await?;
            let mut problems = 0;
            for diagnostic in &loaded.diagnostics {
                println!("{}: {}", diagnostic.path, diagnostic.message);
                problems += 1;
            }
            for track in &loaded.project.content.timeline.tracks {
                for violation in track.invariant_violations() {
                    println!("{} track: {}", track.name(), violation);
                    problems += 1;
                }
            }
            if problems > 0 {
                bail!("{} problem(s) found", problems);
            }
            println!("ok");
        }

        Commands::ExportSubtitles {
            project,
            format,
            languages,
            start,
            end,
            output,
        } => {
            let project = ctx.load_project(&project).await?.project;
            let format = format.unwrap_or(ctx.settings.export.default_subtitle_format);
            let targets = if languages.is_empty() {
                ctx.settings.export.default_targets.clone()
            } else {
                languages
            };
            let window = window(&project, start, end);
            let clips = project.content.timeline.subtitle_clips();

            let output = output.unwrap_or_else(|| {
                let span = window.unwrap_or_else(|| {
                    TimeRange::new(0, clips.last().map(|c| c.end_time()).unwrap_or(0))
                });
                PathBuf::from(format!(
                    "{}.{}",
                    project.detail.generate_export_file_name(span, clips),
                    format.extension()
                ))
            });

            let request = SubtitleExportRequest {
                format,
                sources: targets.iter().map(|t| TextSource::from_target(t)).collect(),
                window,
            };
            let mut record = Exportation::for_subtitles(random_id(), &output, window, clips);

            let cancel = CancelToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let count = export_subtitle_file(clips, &request, &output, &cancel, &mut record).await?;
            println!("{} block(s) written to {}", count, output.display());
        }

        Commands::VerseRange {
            project,
            start,
            end,
        } => {
            let project = ctx.load_project(&project).await?.project;
            let clips = project.content.timeline.subtitle_clips();
            let window = window(&project, start, end).unwrap_or_else(|| {
                TimeRange::new(0, clips.last().map(|c| c.end_time()).unwrap_or(0))
            });
            println!("{}", VerseRange::get_verse_range(window, clips));
        }
    }

    Ok(())
}

//! Callsheet CLI
//!
//! Edits a production-day schedule file. Every command opens an editor
//! session on the file, applies one change and flushes the autosave.

mod table;

use anyhow::{bail, Context, Result};
use callsheet_core::autosave::AutosaveState;
use callsheet_core::config::{AutosaveConfig, EditorConfig};
use callsheet_core::editing::{HeaderEdit, ItemEdit};
use callsheet_core::project::{ensure_extension, FileSink};
use callsheet_core::session::EditorSession;
use callsheet_core::types::{ClockTime, DayNight, Document, IntExt, ShotDetails, ShotList};
use callsheet_media::JpegCodec;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "callsheet")]
#[command(about = "Build and retime a shooting-day call sheet")]
#[command(version)]
struct Cli {
    /// Call sheet file (`.callsheet` is appended if missing)
    file: PathBuf,

    /// Log filter, e.g. `debug` or `callsheet_core=trace` (defaults to RUST_LOG, then `info`)
    #[arg(long, global = true)]
    log: Option<String>,

    /// Editor settings as JSON (default durations, image compression, history depth)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Autosave quiet period in milliseconds
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty call sheet
    New {
        #[arg(long, default_value = "Untitled")]
        title: String,

        /// Call time as HH:MM
        #[arg(long, default_value = "07:00")]
        call_time: ClockTime,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the schedule
    Show,

    /// Append a shot
    AddShot {
        #[arg(long, default_value = "")]
        scene: String,

        #[arg(long, default_value = "")]
        shot: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        location: String,

        /// Comma-separated cast list
        #[arg(long, value_delimiter = ',')]
        cast: Vec<String>,

        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Append a break
    AddBreak {
        #[arg(long, default_value = "Break")]
        description: String,

        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Set an item's duration in minutes (negative values become 0)
    SetDuration {
        /// 1-based position or item id
        item: String,

        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },

    /// Set an item's end time; the duration follows
    SetEnd { item: String, end: ClockTime },

    /// Set the first item's start time, which moves the call time
    SetStart { item: String, start: ClockTime },

    /// Move the whole day to a new call time
    SetCallTime { call_time: ClockTime },

    /// Change a descriptive field on an item
    SetField {
        item: String,

        /// description, scene, shot, int-ext, day-night, location, size,
        /// angle, movement, lens, cast, props, costume, notes
        field: String,

        value: String,
    },

    /// Change a header field
    SetHeader {
        /// title, date, director, producer, location, notes
        field: String,

        value: String,
    },

    /// Move an item to a new position (1-based)
    Move { from: usize, to: usize },

    /// Remove an item and its reference image
    Remove { item: String },

    /// Append shots from a shot-list JSON file
    Import {
        shot_list: PathBuf,

        /// Source record ids to import (all when omitted)
        #[arg(long = "select")]
        selected: Vec<Uuid>,

        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Attach a reference image to an item
    Attach { item: String, image: PathBuf },

    /// Remove an item's reference image
    Detach { item: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());
    run(cli).await
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(f) => tracing_subscriber::EnvFilter::new(f),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_editor_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid config {}", path.display()))
}

async fn run(cli: Cli) -> Result<()> {
    let path = ensure_extension(&cli.file);

    if let Commands::New {
        title,
        call_time,
        force,
    } = &cli.command
    {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        let document = Document::new(title.clone(), *call_time);
        document
            .save_to_file(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{}", table::render(&document));
        return Ok(());
    }

    let config = load_editor_config(cli.config.as_deref())?;
    let mut autosave = AutosaveConfig::default();
    if let Some(ms) = cli.debounce_ms {
        autosave.debounce_ms = ms;
    }

    let document = Document::load_from_file(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut session =
        EditorSession::new(document, config).with_autosave(autosave, FileSink::new(&path));

    let changed = apply(&mut session, cli.command).await?;
    if !changed {
        tracing::info!("nothing changed");
    }

    session.flush().await.context("Failed to save")?;
    if let Some(status) = session.autosave_status() {
        if status.state == AutosaveState::Error || changed {
            eprintln!("{}", table::autosave_line(&status));
        }
    }
    let document = session.close().await.context("Failed to save")?;
    println!("{}", table::render(&document));
    Ok(())
}

/// Apply one command. Returns whether the document changed.
async fn apply(session: &mut EditorSession, command: Commands) -> Result<bool> {
    let changed = match command {
        Commands::New { .. } | Commands::Show => false,

        Commands::AddShot {
            scene,
            shot,
            description,
            location,
            cast,
            minutes,
        } => {
            let details = ShotDetails {
                scene_number: scene,
                shot_number: shot,
                description,
                location,
                cast,
                ..Default::default()
            };
            let id = session.add_shot(details, minutes)?;
            tracing::info!(%id, "added shot");
            true
        }

        Commands::AddBreak {
            description,
            minutes,
        } => {
            let id = session.add_break(description, minutes)?;
            tracing::info!(%id, "added break");
            true
        }

        Commands::SetDuration { item, minutes } => {
            let id = resolve_item(session, &item)?;
            session.edit_item(id, ItemEdit::Duration(minutes))?
        }

        Commands::SetEnd { item, end } => {
            let id = resolve_item(session, &item)?;
            session.edit_item(id, ItemEdit::End(end))?
        }

        Commands::SetStart { item, start } => {
            let id = resolve_item(session, &item)?;
            let changed = session.edit_item(id, ItemEdit::Start(start))?;
            if !changed && session.read(|doc| doc.index_of(id)) != Some(0) {
                eprintln!("start time can only be set on the first item");
            }
            changed
        }

        Commands::SetCallTime { call_time } => {
            session.edit_header(HeaderEdit::CallTime(call_time))?
        }

        Commands::SetField { item, field, value } => {
            let id = resolve_item(session, &item)?;
            session.edit_item(id, parse_item_edit(&field, value)?)?
        }

        Commands::SetHeader { field, value } => {
            session.edit_header(parse_header_edit(&field, value)?)?
        }

        Commands::Move { from, to } => {
            let len = session.read(|doc| doc.items.len());
            if from == 0 || to == 0 || from > len || to > len {
                bail!("positions must be between 1 and {len}");
            }
            session.reorder(from - 1, to - 1)?
        }

        Commands::Remove { item } => {
            let id = resolve_item(session, &item)?;
            session.remove_item(id)?;
            true
        }

        Commands::Import {
            shot_list,
            selected,
            minutes,
        } => {
            let data = std::fs::read_to_string(&shot_list)
                .with_context(|| format!("Failed to read {}", shot_list.display()))?;
            let list: ShotList = serde_json::from_str(&data)
                .with_context(|| format!("Invalid shot list {}", shot_list.display()))?;
            let selected = if selected.is_empty() {
                list.shots.iter().map(|s| s.id).collect()
            } else {
                selected
            };
            let ids = session.import(&list, &selected, minutes)?;
            println!("imported {} shot(s)", ids.len());
            !ids.is_empty()
        }

        Commands::Attach { item, image } => {
            let id = resolve_item(session, &item)?;
            let raw = std::fs::read(&image)
                .with_context(|| format!("Failed to read {}", image.display()))?;
            if let Some(warning) = session.attach_image(id, Arc::new(JpegCodec), raw).await? {
                eprintln!("warning: {warning}");
            }
            true
        }

        Commands::Detach { item } => {
            let id = resolve_item(session, &item)?;
            session.detach_image(id)?
        }
    };
    Ok(changed)
}

/// Accept a 1-based position or a full item id.
fn resolve_item(session: &EditorSession, selector: &str) -> Result<Uuid> {
    session.read(|doc| {
        if let Ok(position) = selector.parse::<usize>() {
            return match position.checked_sub(1).and_then(|i| doc.items.get(i)) {
                Some(item) => Ok(item.id()),
                None => bail!("no item at position {position}"),
            };
        }
        let id = Uuid::parse_str(selector)
            .with_context(|| format!("{selector:?} is neither a position nor an item id"))?;
        match doc.item(id) {
            Some(_) => Ok(id),
            None => bail!("no item with id {id}"),
        }
    })
}

fn parse_int_ext(value: &str) -> Result<IntExt> {
    Ok(match value.to_ascii_lowercase().as_str() {
        "int" => IntExt::Int,
        "ext" => IntExt::Ext,
        "int/ext" | "i/e" => IntExt::IntExt,
        other => bail!("unknown INT/EXT value {other:?}"),
    })
}

fn parse_day_night(value: &str) -> Result<DayNight> {
    Ok(match value.to_ascii_lowercase().as_str() {
        "day" => DayNight::Day,
        "night" => DayNight::Night,
        "dawn" => DayNight::Dawn,
        "dusk" => DayNight::Dusk,
        other => bail!("unknown DAY/NIGHT value {other:?}"),
    })
}

fn parse_item_edit(field: &str, value: String) -> Result<ItemEdit> {
    Ok(match field {
        "description" => ItemEdit::Description(value),
        "scene" => ItemEdit::SceneNumber(value),
        "shot" => ItemEdit::ShotNumber(value),
        "int-ext" => ItemEdit::IntExt(parse_int_ext(&value)?),
        "day-night" => ItemEdit::DayNight(parse_day_night(&value)?),
        "location" => ItemEdit::Location(value),
        "size" => ItemEdit::ShotSize(value),
        "angle" => ItemEdit::Angle(value),
        "movement" => ItemEdit::Movement(value),
        "lens" => ItemEdit::Lens(value),
        "cast" => ItemEdit::Cast(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        ),
        "props" => ItemEdit::Props(value),
        "costume" => ItemEdit::Costume(value),
        "notes" => ItemEdit::Notes(value),
        other => bail!("unknown item field {other:?}"),
    })
}

fn parse_header_edit(field: &str, value: String) -> Result<HeaderEdit> {
    Ok(match field {
        "title" => HeaderEdit::Title(value),
        "date" => HeaderEdit::ShootDate(value),
        "director" => HeaderEdit::Director(value),
        "producer" => HeaderEdit::Producer(value),
        "location" => HeaderEdit::Location(value),
        "notes" => HeaderEdit::Notes(value),
        other => bail!("unknown header field {other:?}"),
    })
}

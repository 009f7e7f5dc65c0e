//! `skirmish`: run the concurrent battle or edit a dungeon file.

mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skirmish_core::feed::{ConsoleSink, FileSink, TracingSink};
use skirmish_core::render::TerminalRenderer;
use skirmish_core::resolver::{CombatResolver, RandomDice};
use skirmish_core::{Editor, Simulation, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "skirmish", version, about = "Concurrent combat simulation")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the concurrent simulation.
    Run(RunArgs),
    /// Edit a dungeon file and run single-threaded battles on it.
    Editor {
        /// Dungeon file with one `<Kind> <name> <x> <y>` record per line.
        #[arg(short, long, global = true, default_value = "dungeon.txt")]
        file: PathBuf,

        #[command(subcommand)]
        action: EditorAction,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// JSON configuration file; missing fields take defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the run length in milliseconds.
    #[arg(long)]
    duration_ms: Option<u64>,
    /// Override the number of randomly placed entities.
    #[arg(long)]
    entities: Option<usize>,
    /// Seed placement, movement and dice.
    #[arg(long)]
    seed: Option<u64>,
    /// File that receives one line per kill.
    #[arg(long, default_value = "battle_log.txt")]
    log: PathBuf,
    /// Do not draw the map every report interval.
    #[arg(long)]
    no_map: bool,
    /// Print the final report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum EditorAction {
    /// Place a new entity and save the file.
    Add {
        /// Knight, Druid or Elf.
        kind: String,
        /// Unique name without whitespace.
        name: String,
        /// X coordinate in 0..=500.
        x: f64,
        /// Y coordinate in 0..=500.
        y: f64,
    },
    /// Print every living entity in the file.
    List,
    /// Fight one round and save the survivors back.
    Battle {
        /// Maximum distance at which two entities fight.
        #[arg(short, long)]
        range: f64,
        /// Seed the dice.
        #[arg(long)]
        seed: Option<u64>,
        /// File that receives one line per kill.
        #[arg(long, default_value = "log.txt")]
        log: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    match cli.command {
        Command::Run(args) => run_command(args),
        Command::Editor { file, action } => editor_command(&file, action),
    }
}

fn run_command(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(duration_ms) = args.duration_ms {
        config.duration_ms = duration_ms;
    }
    if let Some(entities) = args.entities {
        config.initial_entities = entities;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    tracing::debug!(?config, "starting simulation");
    let mut sim = Simulation::new(config).context("invalid simulation settings")?;
    sim.populate_random()?;

    // JSON output owns stdout; kills then only go to the log file and tracing.
    if args.json {
        sim.attach_sink(Arc::new(TracingSink));
    } else {
        sim.attach_sink(Arc::new(ConsoleSink::new()));
    }
    sim.attach_sink(Arc::new(FileSink::new(&args.log)));
    if !args.no_map && !args.json {
        sim.set_renderer(TerminalRenderer::stdout());
    }

    let report = sim.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{report}");
        println!("Battle log written to {}", args.log.display());
    }
    Ok(())
}

fn open_editor(file: &Path) -> Result<Editor> {
    let mut editor = Editor::new();
    if file.exists() {
        editor
            .load(file)
            .with_context(|| format!("failed to load {}", file.display()))?;
        tracing::info!(file = %file.display(), entities = editor.len(), "dungeon loaded");
    }
    Ok(editor)
}

fn editor_command(file: &Path, action: EditorAction) -> Result<()> {
    let mut editor = open_editor(file)?;

    match action {
        EditorAction::Add { kind, name, x, y } => {
            editor
                .add(&kind, &name, x, y)
                .with_context(|| format!("cannot add {kind} `{name}`"))?;
            editor.save(file)?;
            println!("Added {kind} `{name}` at ({x}, {y}); {} in total", editor.len());
        }
        EditorAction::List => {
            print!("{}", editor.listing());
        }
        EditorAction::Battle { range, seed, log } => {
            editor.attach_sink(Arc::new(ConsoleSink::new()));
            editor.attach_sink(Arc::new(FileSink::new(&log)));
            let dice = seed.map_or_else(RandomDice::from_entropy, RandomDice::seeded);
            let summary = editor.battle(range, &mut CombatResolver::new(dice));
            editor.save(file)?;
            if summary.engagements == 0 {
                println!("No fights within {range}.");
            }
            println!(
                "{} engagements, {} kills, {} survivors saved to {}",
                summary.engagements,
                summary.kills,
                summary.survivors,
                file.display()
            );
        }
    }
    Ok(())
}

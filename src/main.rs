//! # Cavecrawl Main Entry Point
//!
//! Loads the settings, starts a session and runs the text game loop.

use cavecrawl::{
    AsciiRenderer, Autopilot, CrawlError, CrawlResult, Difficulty, GameState, GenerationConfig,
    InputHandler, PlayerInput, Settings, HELP,
};
use clap::Parser;
use log::{error, info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Command line arguments for Cavecrawl.
#[derive(Parser, Debug)]
#[command(name = "cavecrawl")]
#[command(about = "A maze-crawling roguelike played in the terminal")]
#[command(version)]
struct Args {
    /// Random seed for maze generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Difficulty preset (easy, normal, hard)
    #[arg(short, long, default_value = "normal")]
    difficulty: Difficulty,

    /// Maze width in cells
    #[arg(long, default_value_t = cavecrawl::config::DEFAULT_MAZE_WIDTH)]
    width: u32,

    /// Maze height in cells
    #[arg(long, default_value_t = cavecrawl::config::DEFAULT_MAZE_HEIGHT)]
    height: u32,

    /// Settings file replacing the built-in presets
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Play without input until the session ends
    #[arg(long)]
    autopilot: bool,

    /// Show what every cave holds on the map
    #[arg(long)]
    reveal: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting Cavecrawl v{}", cavecrawl::VERSION);
    if let Err(e) = run(&args) {
        error!("{e}");
        eprintln!("cavecrawl: {e}");
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_new(log_level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .parse_default_env()
            .init();
    }
}

fn run(args: &Args) -> CrawlResult<()> {
    let settings = match &args.settings {
        Some(path) => Settings::load_from_path(path)?,
        None => Settings::builtin()?,
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    let generation = GenerationConfig::new(seed).with_size(args.width, args.height);

    #[cfg(feature = "dev-tools")]
    let _session_span =
        tracing::info_span!("session", seed, difficulty = %args.difficulty).entered();

    info!("Generating a {} maze with seed {}", args.difficulty, seed);
    let mut game_state = GameState::new_session(&settings, args.difficulty, generation)?;

    let mut renderer = AsciiRenderer::new();
    renderer.reveal_caves = args.reveal;
    renderer.add_message(format!("Welcome to Cavecrawl! Seed {seed}"));

    if args.autopilot {
        run_autopilot(&mut game_state, &mut renderer)
    } else {
        run_game_loop(&mut game_state, &mut renderer)
    }
}

/// Reads commands from stdin until the player quits or input runs out.
fn run_game_loop(game_state: &mut GameState, renderer: &mut AsciiRenderer) -> CrawlResult<()> {
    let input_handler = InputHandler::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let events = game_state.drain_events();
    renderer.record(game_state, &events);
    write!(stdout, "{}> ", renderer.render(game_state))?;
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            write!(stdout, "> ")?;
            stdout.flush()?;
            continue;
        }

        match input_handler.parse(&line) {
            Ok(PlayerInput::Quit) => {
                info!("Player quit the game");
                break;
            }
            Ok(PlayerInput::Help) => writeln!(stdout, "{HELP}")?,
            Ok(PlayerInput::ShowInventory) => {
                writeln!(stdout, "{}", renderer.render_inventory(game_state))?
            }
            Ok(PlayerInput::NewGame) if !game_state.completion_state.is_over() => {
                renderer.add_message("Finish this crawl first".to_string());
            }
            Ok(input) => {
                let accepted = input_handler.execute(input, game_state)?;
                let events = game_state.drain_events();
                renderer.record(game_state, &events);
                if !accepted && matches!(input, PlayerInput::Move(_)) {
                    warn!("Move {input:?} was blocked");
                }
            }
            Err(CrawlError::InvalidAction(reason)) => renderer.add_message(reason),
            Err(e) => return Err(e),
        }

        write!(stdout, "{}", renderer.render(game_state))?;
        if let Some(message) = game_state.completion_state.message() {
            writeln!(stdout, "{message} Type 'new' for another crawl or 'quit'.")?;
        }
        write!(stdout, "> ")?;
        stdout.flush()?;
    }

    print_summary(game_state);
    Ok(())
}

/// Lets the autopilot play until the session ends or it runs out of moves.
fn run_autopilot(game_state: &mut GameState, renderer: &mut AsciiRenderer) -> CrawlResult<()> {
    let input_handler = InputHandler::new();
    let mut autopilot = Autopilot::new();
    autopilot.toggle();

    for _ in 0..10_000 {
        let Some(input) = autopilot.next_input(game_state) else {
            break;
        };
        input_handler.execute(input, game_state)?;
        let events = game_state.drain_events();
        renderer.record(game_state, &events);
    }

    println!("{}", renderer.render(game_state));
    print_summary(game_state);
    Ok(())
}

fn print_summary(game_state: &GameState) {
    let stats = &game_state.statistics;
    println!(
        "{} | steps {} | caves {} | enemies defeated {} | damage dealt {:.0} | damage taken {:.0} | coins earned {}",
        game_state
            .completion_state
            .message()
            .unwrap_or("Crawl abandoned"),
        stats.steps_taken,
        stats.caves_visited,
        stats.enemies_defeated,
        stats.damage_dealt,
        stats.damage_taken,
        stats.coins_earned
    );
}

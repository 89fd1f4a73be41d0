//! # Delve Main Entry Point
//!
//! Parses the command line, builds or loads a session and runs either the
//! interactive prompt or the autoplay bot.

use clap::Parser;
use delve::{
    command_to_combat_action, AutoplayPolicy, Bestiary, DelveError, DelveResult, DungeonGenerator,
    DungeonReport, GameState, GamePhase, GenerationConfig, Generator, InputHandler, PlayerClass,
    PlayerCommand, Seed, TerminalDisplay, HELP_TEXT,
};
use log::{error, info};

/// Command line arguments for Delve.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "A turn-based dungeon crawler over a seeded room graph")]
#[command(version)]
struct Args {
    /// Seed for dungeon generation, text or number
    #[arg(short, long)]
    seed: Option<String>,

    /// Number of dungeon levels, entrance and boss included
    #[arg(long)]
    levels: Option<u32>,

    /// Maximum rooms on one level
    #[arg(long)]
    max_rooms: Option<u32>,

    /// Chance of extra forward connections (0.0 to 1.0)
    #[arg(long)]
    convergence: Option<f64>,

    /// Generation config file (JSON); flags override its values
    #[arg(long)]
    config: Option<String>,

    /// Character class: fighter or warlock
    #[arg(long, default_value = "fighter")]
    class: String,

    /// Character name
    #[arg(long, default_value = "Adventurer")]
    name: String,

    /// Resume a saved game instead of starting a new one
    #[arg(long)]
    load: Option<String>,

    /// Let the bot play the whole run
    #[arg(long)]
    auto: bool,

    /// Step limit for --auto
    #[arg(long, default_value_t = 10_000)]
    max_steps: usize,

    /// Print the dungeon map and diagnostics, then exit
    #[arg(long)]
    map_only: bool,

    /// Write a JSON dungeon report to this path
    #[arg(long)]
    report: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);
    info!("Starting Delve v{}", delve::VERSION);

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Initializes `env_logger`. `RUST_LOG` wins over `--log-level`.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

fn build_config(args: &Args) -> DelveResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = &args.seed {
        config.seed = seed.parse::<Seed>()?;
    }
    if let Some(levels) = args.levels {
        config.levels = levels;
    }
    if let Some(max_rooms) = args.max_rooms {
        config.max_rooms_per_level = max_rooms;
    }
    if let Some(convergence) = args.convergence {
        config.convergence_rate = convergence;
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> DelveResult<()> {
    let config = build_config(&args)?;

    if args.map_only {
        let mut rng = config.create_rng();
        let graph = DungeonGenerator::new().generate(&config, &mut rng)?;
        let report = DungeonReport::from_graph(&graph, &config);
        println!("{}", TerminalDisplay::new().render_map(&graph));
        println!(
            "{} rooms, {} connections, shortest route {:?}",
            report.room_count, report.connection_count, report.shortest_route
        );
        for problem in &report.diagnostics {
            println!("warning: {}", problem);
        }
        if let Some(path) = &args.report {
            report.write_to_file(path)?;
        }
        return Ok(());
    }

    let mut state = match &args.load {
        Some(path) => {
            info!("Loading save from {}", path);
            GameState::load_from_file(path)?
        }
        None => {
            let class: PlayerClass = args.class.parse()?;
            GameState::new(config, args.name.clone(), class)?
        }
    };
    if let Some(path) = &args.report {
        DungeonReport::from_graph(&state.graph, &state.config).write_to_file(path)?;
    }

    let provider = Bestiary::new();
    if args.auto {
        let report = AutoplayPolicy::new().run(&mut state, &provider, args.max_steps).await?;
        let journal = state.journal();
        for line in &journal[journal.len().saturating_sub(15)..] {
            println!("{}", line);
        }
        println!("{}", TerminalDisplay::new().render_status(&state.player));
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    run_interactive(&mut state, &provider).await
}

async fn run_interactive(state: &mut GameState, provider: &Bestiary) -> DelveResult<()> {
    let display = TerminalDisplay::new();
    let mut input = InputHandler::new(std::io::stdin().lock()).with_prompt("> ");
    let mut seen = 0;

    println!("Type `help` for commands.");
    loop {
        for line in &state.journal()[seen..] {
            println!("{}", line);
        }
        seen = state.journal().len();

        match state.phase() {
            GamePhase::Victory => {
                println!("The dungeon is conquered!");
                break;
            }
            GamePhase::Defeat => {
                println!("Your journey ends here.");
                break;
            }
            GamePhase::Combat => println!("{}", display.render_combat(state)),
            GamePhase::Exploring => {
                if let Some(room) = state.current_room() {
                    println!("{}", display.render_room(&state.graph, room));
                }
            }
        }

        let command = match input.next_command() {
            Ok(Some(command)) => command,
            Ok(None) => break,
            Err(DelveError::Parse(message)) => {
                println!("{}", message);
                continue;
            }
            Err(e) => return Err(e),
        };

        match dispatch(state, &display, command, provider).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e @ (DelveError::InvalidAction(_) | DelveError::InvalidState(_))) => println!("{}", e),
            Err(e) => return Err(e),
        }
    }
    println!(
        "Rooms cleared: {}  Enemies defeated: {}  Turns: {}",
        state.statistics.rooms_cleared, state.statistics.enemies_defeated, state.turn_number
    );
    Ok(())
}

fn inventory_id(state: &GameState, slot: usize) -> DelveResult<delve::EntityId> {
    state
        .player
        .inventory
        .get(slot)
        .map(|item| item.id)
        .ok_or_else(|| DelveError::InvalidAction(format!("no item in slot {}", slot)))
}

/// Runs one command. Returns `false` when the player quits.
async fn dispatch(
    state: &mut GameState,
    display: &TerminalDisplay,
    command: PlayerCommand,
    provider: &Bestiary,
) -> DelveResult<bool> {
    if let Some(action) = match state.phase() {
        GamePhase::Combat => command_to_combat_action(&command, state)?,
        _ => None,
    } {
        state.combat_action(action)?;
        return Ok(true);
    }

    match command {
        PlayerCommand::Go(room) => {
            state.enter_room(room, provider).await?;
        }
        PlayerCommand::Claim => {
            state.complete_current_room()?;
        }
        PlayerCommand::Interact(index) => {
            state.interact(index)?;
        }
        PlayerCommand::Disarm(index) => {
            state.disarm_trap(index)?;
        }
        PlayerCommand::Answer(answer) => {
            state.solve_puzzle(&answer)?;
        }
        PlayerCommand::Buy(index) => {
            state.buy(index)?;
        }
        PlayerCommand::Sell(slot) => {
            let item_id = inventory_id(state, slot)?;
            state.sell(item_id)?;
        }
        PlayerCommand::Use(slot) => {
            let item_id = inventory_id(state, slot)?;
            state.use_item(item_id)?;
        }
        PlayerCommand::Equip(slot) => {
            let item_id = inventory_id(state, slot)?;
            state.equip(item_id)?;
        }
        PlayerCommand::Unequip(slot) => {
            state.unequip(slot)?;
        }
        PlayerCommand::Attack(_) | PlayerCommand::Cast { .. } | PlayerCommand::Flee => {
            println!("There is nothing to fight here");
        }
        PlayerCommand::Map => println!("{}", display.render_map(&state.graph)),
        PlayerCommand::Status => println!("{}", display.render_status(&state.player)),
        PlayerCommand::Inventory => println!("{}", display.render_inventory(&state.player)),
        PlayerCommand::Save(path) => {
            state.save_to_file(&path)?;
            println!("Saved to {}", path);
        }
        PlayerCommand::Help => println!("{}", HELP_TEXT),
        PlayerCommand::Quit => return Ok(false),
    }
    Ok(true)
}

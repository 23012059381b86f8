use clap::{Parser, Subcommand};
#[cfg(feature = "perft")]
use kfchess::game::perft::PerftConfig;
use kfchess::{
    game::{fen::STARTING_NFEN, play::Game, selfplay::SelfPlayConfig},
    pgn::MoveLogOptions,
    protocols::sync::{
        authority::{GameConfig, DEFAULT_COOLDOWN, DEFAULT_MAX_IDLE},
        sync_host,
    },
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hosts games over standard I/O, one JSON message per line (DEFAULT)
    Host {
        /// Cooldown of pieces after they move, in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_COOLDOWN)]
        cooldown: u64,
        /// Drops games without any move for this long, in milliseconds
        #[arg(long, default_value_t = DEFAULT_MAX_IDLE)]
        max_idle: u64,
    },
    /// Runs perft (generating all moves up to a certain depth)
    Perft {
        /// Maximum depth to reach
        depth: u8,
        /// Starting position as an nFEN string.
        #[arg(short, long)]
        position: Option<String>,
        /// Shows move count for each move from the starting position
        #[arg(short)]
        divide: bool,
        /// Generates moves for each depth up to the maximum
        #[arg(short)]
        iterative: bool,
        /// Show timing information
        #[arg(long)]
        bench: bool,
        /// Counts moves at horizon nodes instead of playing each of them
        #[arg(short)]
        bulk: bool,

        /// Does not show the board and other decorations
        #[arg(long)]
        no_board: bool,
    },
    /// Checks an nFEN string, printing the position it describes
    Validate { nfen: String },
    /// Plays random moves and prints the resulting move log
    Random {
        /// Starting position as an nFEN string.
        #[arg(short, long)]
        position: Option<String>,
        /// Maximum number of moves to play
        #[arg(short, long, default_value_t = 100)]
        moves: usize,
        /// Cooldown of pieces after they move, in milliseconds
        #[arg(short, long, default_value_t = 0)]
        cooldown: u64,
        /// Milliseconds between two attempts to move
        #[arg(long, default_value_t = 100)]
        time_step: u64,
        /// Seed of the random number generator
        #[arg(short, long)]
        seed: Option<u64>,
        /// Wraps the move log at this width
        #[arg(long, default_value_t = 0)]
        width: usize,
    },
}

fn load_game(position: Option<String>) -> Game {
    let nfen = position.as_deref().unwrap_or(STARTING_NFEN);
    match Game::from_nfen(nfen) {
        Ok(game) => game,
        Err(e) => {
            log::error!("invalid nFEN {nfen:?}: {e}");
            std::process::exit(1)
        }
    }
}

pub fn main() {
    let args = Arguments::parse();
    env_logger::init();

    match args.command.unwrap_or(Command::Host {
        cooldown: DEFAULT_COOLDOWN,
        max_idle: DEFAULT_MAX_IDLE,
    }) {
        Command::Host { cooldown, max_idle } => {
            let config = GameConfig::new()
                .with_cooldown(cooldown)
                .with_max_idle(max_idle);
            if let Err(e) = sync_host(config) {
                log::error!("host stopped: {e}");
                std::process::exit(1)
            }
        }
        #[cfg(feature = "perft")]
        Command::Perft {
            position,
            depth,
            divide,
            iterative,
            bench,
            bulk,
            no_board,
        } => {
            let mut game = load_game(position);
            PerftConfig {
                depth,
                divide,
                iterative,
                bench,
                bulk_counting: bulk,
                show_board: !no_board,
            }
            .go(&mut game);
        }
        #[cfg(not(feature = "perft"))]
        Command::Perft { .. } => {
            eprintln!("kfchess has not been compiled with feature `perft`");
        }
        Command::Validate { nfen } => {
            let game = load_game(Some(nfen));
            println!("{}", game.position());
            println!("{}", game.nfen());
            println!("{}", game.state());
        }
        Command::Random {
            position,
            moves,
            cooldown,
            time_step,
            seed,
            width,
        } => {
            let mut game = load_game(position);
            let mut config = SelfPlayConfig::new()
                .with_max_moves(moves)
                .with_cooldown(cooldown)
                .with_time_step(time_step);
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            config.go(&mut game);
            let result = game.state().result_token();
            game.position_mut().set_header("Result", result);
            println!(
                "{}",
                game.move_log(&MoveLogOptions::default().with_max_width(width))
            );
        }
    }
}

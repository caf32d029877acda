//! # 2048 CLI
//!
//! Command-line front end for the rule engine: play interactively in the
//! terminal or run headless simulations with a simple policy.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tile_merge_core::{
    highlights, legal_directions, Cell, Direction, Game, GameState, GameStatus, Highlights,
};

#[derive(Parser, Debug)]
#[command(name = "tile-merge")]
#[command(author, version, about = "Play 2048 in the terminal or run simulations")]
struct Args {
    /// Number of episodes to run in headless mode (interactive if omitted)
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs (OS entropy if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum moves per episode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_steps: u32,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// Keep playing after reaching 2048 instead of stopping there
    #[arg(short, long)]
    keep_playing: bool,

    /// Show the board after each move in headless mode
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Random legal moves
    Random,
    /// Cycle through Left, Down, Right, Up, skipping illegal moves
    Cycle,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    match args.episodes {
        Some(episodes) => run_headless(&args, episodes),
        None => run_interactive(&args),
    }
}

fn new_game(seed: Option<u64>) -> Game {
    match seed {
        Some(seed) => Game::new(seed),
        None => Game::from_entropy(),
    }
}

// -----------------------------------------------------------------------------
// Interactive mode
// -----------------------------------------------------------------------------

fn run_interactive(args: &Args) -> Result<()> {
    let _raw = RawMode::enable().context("failed to switch the terminal to raw mode")?;

    let mut game = new_game(args.seed);
    let mut state = game.init_game();
    let mut marks = highlights(None, &state);
    let mut continue_after_win = args.keep_playing;
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 3];

    draw(&state, &marks, 0, continue_after_win)?;

    loop {
        let bytes_read = stdin.read(&mut buffer).context("failed to read from stdin")?;
        if bytes_read == 0 {
            break;
        }

        match parse_input(&buffer[..bytes_read]) {
            InputAction::Move(direction) => {
                if state.status == GameStatus::Lost
                    || (state.status == GameStatus::Won && !continue_after_win)
                {
                    continue;
                }
                let advanced = match game.make_move(&state, direction) {
                    Cow::Owned(next) => Some(next),
                    Cow::Borrowed(_) => None,
                };
                if let Some(next) = advanced {
                    let gained = next.score - state.score;
                    marks = highlights(Some(&state), &next);
                    state = next;
                    draw(&state, &marks, gained, continue_after_win)?;
                }
            }
            InputAction::Continue => {
                if state.status == GameStatus::Won && !continue_after_win {
                    continue_after_win = true;
                    draw(&state, &Highlights::default(), 0, continue_after_win)?;
                }
            }
            InputAction::Restart => {
                state = game.init_game();
                marks = highlights(None, &state);
                continue_after_win = args.keep_playing;
                draw(&state, &marks, 0, continue_after_win)?;
            }
            InputAction::Quit => {
                println!("\nGoodbye!");
                break;
            }
            InputAction::None => {}
        }
    }

    Ok(())
}

enum InputAction {
    Move(Direction),
    Continue,
    Restart,
    Quit,
    None,
}

fn parse_input(bytes: &[u8]) -> InputAction {
    match bytes {
        // Arrow keys (escape sequences)
        [27, 91, 65] => InputAction::Move(Direction::Up),
        [27, 91, 66] => InputAction::Move(Direction::Down),
        [27, 91, 67] => InputAction::Move(Direction::Right),
        [27, 91, 68] => InputAction::Move(Direction::Left),

        // Control keys: q, Ctrl+C, Esc
        [b'q'] | [b'Q'] | [3] | [27] => InputAction::Quit,
        [b'r'] | [b'R'] => InputAction::Restart,
        [b'c'] | [b'C'] => InputAction::Continue,

        // WASD
        [key] => std::str::from_utf8(&[*key])
            .ok()
            .and_then(Direction::from_key)
            .map_or(InputAction::None, InputAction::Move),

        _ => InputAction::None,
    }
}

const CONTROLS: &str = "Controls: WASD or Arrow Keys | Q to quit | R to restart | C to continue after a win";

const NEW_TILE: &str = "\x1b[1;32m";
const MERGED_TILE: &str = "\x1b[1;33m";
const RESET: &str = "\x1b[0m";

fn draw(state: &GameState, marks: &Highlights, gained: u32, continue_after_win: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "\x1b[2J\x1b[H")?;
    writeln!(out, "=== 2048 ===")?;
    writeln!(out, "{CONTROLS}\n")?;
    write!(out, "Score: {}", state.score)?;
    if gained > 0 {
        write!(out, "  (+{gained})")?;
    }
    writeln!(out)?;

    let size = state.grid.size();
    let separator = format!("+{}", "------+".repeat(size));
    writeln!(out, "{separator}")?;
    for row in 0..size {
        write!(out, "|")?;
        for col in 0..size {
            match state.grid.tile_at(Cell::new(row, col)) {
                Some(tile) => {
                    let colour = if marks.new_tiles.contains(&tile.id()) {
                        NEW_TILE
                    } else if marks.merged_tiles.contains(&tile.id()) {
                        MERGED_TILE
                    } else {
                        ""
                    };
                    let reset = if colour.is_empty() { "" } else { RESET };
                    write!(out, "{colour}{:^6}{reset}|", tile.value())?;
                }
                None => write!(out, "      |")?,
            }
        }
        writeln!(out, "\n{separator}")?;
    }

    match state.status {
        GameStatus::Won if !continue_after_win => {
            writeln!(out, "\n  *** YOU WIN! ***\n  Press C to keep playing, R to restart or Q to quit")?;
        }
        GameStatus::Lost => {
            writeln!(out, "\n  *** GAME OVER ***")?;
            writeln!(out, "  Final Score: {}\n  Max Tile: {}", state.score, state.grid.max_value())?;
            writeln!(out, "\n  Press R to restart or Q to quit")?;
        }
        _ => {}
    }

    out.flush().context("failed to flush stdout")
}

// -----------------------------------------------------------------------------
// Headless mode
// -----------------------------------------------------------------------------

struct Episode {
    score: u32,
    max_tile: u32,
    moves: u32,
    won: bool,
}

fn run_headless(args: &Args, episodes: u32) -> Result<()> {
    anyhow::ensure!(episodes > 0, "--episodes must be at least 1");

    let base_seed = args.seed.unwrap_or_else(rand::random);
    // Separate RNG for move selection
    let mut policy_rng = SmallRng::seed_from_u64(base_seed.wrapping_add(1000));
    let mut results = Vec::with_capacity(episodes as usize);

    for episode in 0..episodes {
        let mut game = Game::new(base_seed.wrapping_add(episode as u64));
        let result = play_episode(args, &mut game, &mut policy_rng, episode);
        info!(
            "episode {}: score={} max_tile={} moves={}",
            episode + 1,
            result.score,
            result.max_tile,
            result.moves
        );
        results.push(result);
    }

    print_summary(args, base_seed, &results);
    Ok(())
}

fn play_episode(args: &Args, game: &mut Game, rng: &mut SmallRng, episode: u32) -> Episode {
    let mut state = game.init_game();
    let mut moves = 0;
    let mut cycle = 0;

    while state.status != GameStatus::Lost && (args.max_steps == 0 || moves < args.max_steps) {
        if state.status == GameStatus::Won && !args.keep_playing {
            break;
        }
        let legal = legal_directions(&state.grid);
        let Some(direction) = (match args.policy {
            Policy::Random => select_random(&legal, rng),
            Policy::Cycle => select_cycle(&legal, &mut cycle),
        }) else {
            break;
        };

        state = game.make_move(&state, direction).into_owned();
        moves += 1;
        debug!("episode {} move {}: {}", episode + 1, moves, direction);

        if args.verbose {
            println!("Episode {} Step {}: {}", episode + 1, moves, direction);
            print!("{state}");
        }
    }

    Episode {
        score: state.score,
        max_tile: state.grid.max_value(),
        moves,
        won: state.has_won,
    }
}

fn select_random(legal: &[Direction], rng: &mut SmallRng) -> Option<Direction> {
    if legal.is_empty() {
        None
    } else {
        Some(legal[rng.gen_range(0..legal.len())])
    }
}

/// Try Left, Down, Right, Up in turn, resuming after the last pick.
fn select_cycle(legal: &[Direction], cycle: &mut usize) -> Option<Direction> {
    let order = [Direction::Left, Direction::Down, Direction::Right, Direction::Up];
    for _ in 0..order.len() {
        let direction = order[*cycle % order.len()];
        *cycle += 1;
        if legal.contains(&direction) {
            return Some(direction);
        }
    }
    None
}

fn print_summary(args: &Args, seed: u64, results: &[Episode]) {
    let episodes = results.len();
    let mut scores: Vec<u32> = results.iter().map(|r| r.score).collect();
    scores.sort_unstable();

    let total: u64 = scores.iter().map(|&s| s as u64).sum();
    let avg_score = total as f64 / episodes as f64;
    let median_score = if episodes % 2 == 0 {
        (scores[episodes / 2 - 1] as f64 + scores[episodes / 2] as f64) / 2.0
    } else {
        scores[episodes / 2] as f64
    };
    let wins = results.iter().filter(|r| r.won).count();
    let max_tile_overall = results.iter().map(|r| r.max_tile).max().unwrap_or(0);
    let total_moves: u64 = results.iter().map(|r| r.moves as u64).sum();

    let mut tile_counts: BTreeMap<u32, u32> = BTreeMap::new();
    for result in results {
        *tile_counts.entry(result.max_tile).or_insert(0) += 1;
    }

    // Parseable key=value output
    println!("=== Simulation Results ===");
    println!("episodes={episodes}");
    println!("policy={:?}", args.policy);
    println!("seed={seed}");
    println!("max_steps={}", args.max_steps);
    println!("avg_score={avg_score:.2}");
    println!("median_score={median_score:.2}");
    println!("min_score={}", scores.first().copied().unwrap_or(0));
    println!("max_score={}", scores.last().copied().unwrap_or(0));
    println!("avg_moves={:.2}", total_moves as f64 / episodes as f64);
    println!("wins={wins}");
    println!("max_tile_overall={max_tile_overall}");
    let distribution: Vec<String> = tile_counts
        .iter()
        .map(|(tile, count)| format!("{tile}:{count}"))
        .collect();
    println!("tile_distribution={}", distribution.join(","));
}

// -----------------------------------------------------------------------------
// Terminal raw mode
// -----------------------------------------------------------------------------

/// Puts stdin into non-canonical, no-echo mode and restores it on drop.
#[cfg(unix)]
struct RawMode {
    original: libc::termios,
}

#[cfg(unix)]
impl RawMode {
    fn enable() -> io::Result<Self> {
        use std::os::unix::io::AsRawFd;
        let fd = io::stdin().as_raw_fd();
        // SAFETY: termios is plain old data and is fully written by tcgetattr.
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut original) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let mut raw = original;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(RawMode { original })
    }
}

#[cfg(unix)]
impl Drop for RawMode {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        let fd = io::stdin().as_raw_fd();
        unsafe {
            libc::tcsetattr(fd, libc::TCSANOW, &self.original);
        }
    }
}

// On non-Unix systems interactive mode needs Enter after each key.
#[cfg(not(unix))]
struct RawMode;

#[cfg(not(unix))]
impl RawMode {
    fn enable() -> io::Result<Self> {
        Ok(RawMode)
    }
}

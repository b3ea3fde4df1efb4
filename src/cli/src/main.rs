use std::{path::PathBuf, sync::Arc};

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::{
    eyre::{OptionExt, WrapErr, eyre},
    owo_colors::OwoColorize,
};
use env_logger::TimestampPrecision;
use itertools::Itertools;
use log::{LevelFilter, info};
use serde_json::json;
use twophase::{
    CubeState, SearchStrategy, SolveError, Solver, Tables,
    facelet,
    history::{
        ANONYMOUS, JsonLinesLog, SolveLog, SolveStats, leaderboard, record_solve, user_profile,
    },
    moves::{format_moves, parse_moves, random_moves},
    solver::ErrorKind,
};

mod config;

use config::CliConfig;

/// Solves 3x3x3 Rubik's Cubes with the two-phase algorithm
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The configuration file to use, in TOML format.
    #[arg(long, short = 'c', value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (can be repeated)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Total move budget.
    #[arg(long, global = true)]
    max_length: Option<usize>,

    /// Seconds to keep looking for shorter solutions once one is found.
    #[arg(long, global = true)]
    timeout: Option<f64>,

    /// `first_solution` or `shortest`.
    #[arg(long, global = true)]
    strategy: Option<SearchStrategy>,

    /// Do not read or write the table cache.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a cube given by its 54 stickers in U, L, F, R, B, D face order.
    Solve {
        /// Either one string of 54 single character colors, or the colors
        /// separated by commas or spaces.
        #[arg(required = true, num_args = 1..)]
        stickers: Vec<String>,
        /// Record the solve in the history under this identity.
        #[arg(long, default_value = ANONYMOUS)]
        user: String,
    },
    /// Scramble a solved cube, print its stickers and solve it.
    Scramble {
        /// The scramble, e.g. "R U' F2".
        moves: Option<String>,
        /// Generate a random scramble of this many moves instead.
        #[arg(long, conflicts_with = "moves")]
        random: Option<usize>,
        /// Seed for the random scramble.
        #[arg(long, requires = "random")]
        seed: Option<u64>,
    },
    /// Build the move and pruning tables and write the cache.
    Tables,
    /// Show the latest solves of one identity.
    History {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Delete a solve from the history.
    Delete { id: u64 },
    /// Solve statistics, overall or for one identity.
    Stats {
        #[arg(long)]
        user: Option<String>,
    },
    /// When an identity first solved and how it has done since.
    Profile {
        #[arg(long)]
        user: String,
    },
    /// Identities ranked by average solution length.
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path)
            .wrap_err_with(|| format!("Failed to read the configuration file {}", path.display()))?,
        None => CliConfig::default(),
    };
    if let Some(max_length) = cli.max_length {
        config.solver.max_length = max_length;
    }
    if let Some(timeout) = cli.timeout {
        config.solver.timeout_secs = timeout;
    }
    if let Some(strategy) = cli.strategy {
        config.solver.strategy = strategy;
    }
    if cli.no_cache {
        config.table_cache = false;
    }

    match cli.command {
        Commands::Solve { stickers, user } => {
            let stickers = split_stickers(&stickers);
            let solver = solver(&config);
            let solution = solver.solve(&stickers).map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&solution)?);

            if user != ANONYMOUS {
                let mut log = history(&config)?;
                record_solve(&mut log, &user, &stickers, &solution)?;
                info!("Recorded the solve in {}", log.path().display());
            }
        }
        Commands::Scramble {
            moves,
            random,
            seed,
        } => {
            let scramble = match (moves, random) {
                (Some(moves), _) => parse_moves(&moves)?,
                (None, Some(length)) => {
                    let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
                    random_moves(&mut rng, length)
                }
                (None, None) => return Err(eyre!("Give a scramble or `--random <LENGTH>`")),
            };
            let state = CubeState::SOLVED.apply_moves(&scramble);
            let stickers = facelet::to_stickers(&state).iter().join("");
            let solution = solver(&config).solve_state(&state).map_err(report)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "scramble": format_moves(&scramble),
                    "stickers": stickers,
                    "solution": solution,
                }))?
            );
        }
        Commands::Tables => {
            let path = config
                .table_cache_path()
                .ok_or_eyre("The table cache is disabled or there is no cache directory")?;
            Tables::generate().save(&path)?;
            println!("Wrote tables to {}", path.display());
        }
        Commands::History { user, limit } => {
            let log = history(&config)?;
            println!(
                "{}",
                format!("{:>6}  {:>5}  {:>8}  solution", "id", "moves", "seconds").bold()
            );
            for record in log.user_solves(&user, limit)? {
                println!(
                    "{:>6}  {:>5}  {:>8.3}  {}",
                    record.id,
                    record.moves_count,
                    record.solve_time,
                    format_moves(&record.solution_steps)
                );
            }
        }
        Commands::Delete { id } => {
            let mut log = history(&config)?;
            if !log.delete_solve(id)? {
                return Err(eyre!("There is no solve with id {id}"));
            }
        }
        Commands::Stats { user } => {
            let log = history(&config)?;
            let records = log
                .all()?
                .into_iter()
                .filter(|record| user.as_ref().is_none_or(|user| &record.identity == user))
                .collect_vec();
            println!(
                "{}",
                serde_json::to_string_pretty(&SolveStats::from_records(&records))?
            );
        }
        Commands::Profile { user } => {
            let log = history(&config)?;
            let profile = user_profile(&log.all()?, &user)
                .ok_or_else(|| eyre!("There are no solves recorded for {user}"))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Commands::Leaderboard { limit } => {
            let log = history(&config)?;
            println!(
                "{}",
                format!("{:>4}  {:<24}  {:>6}  {:>9}", "rank", "identity", "solves", "avg moves")
                    .bold()
            );
            for (rank, entry) in leaderboard(&log.all()?, limit).iter().enumerate() {
                println!(
                    "{:>4}  {:<24}  {:>6}  {:>9.2}",
                    rank + 1,
                    entry.identity,
                    entry.solves,
                    entry.average_moves
                );
            }
        }
    }

    Ok(())
}

fn solver(config: &CliConfig) -> Solver {
    let tables = Tables::load_or_generate(config.table_cache_path().as_deref());
    Solver::new(Arc::new(tables), config.solver.clone())
}

fn history(config: &CliConfig) -> color_eyre::Result<JsonLinesLog> {
    let path = config
        .history_path()
        .ok_or_eyre("Set `history_path` in the configuration file; there is no data directory")?;
    Ok(JsonLinesLog::open(path)?)
}

/// Client errors are reported as such; everything else is the solver's fault.
fn report(e: SolveError) -> color_eyre::Report {
    match e.kind() {
        ErrorKind::ClientError => eyre!("Invalid cube: {e}"),
        ErrorKind::InternalError => eyre!(e),
    }
}

/// Accepts `"UUU...D"` as well as `"W,W,W ..."` or one color per argument.
fn split_stickers(args: &[String]) -> Vec<String> {
    let tokens = args
        .iter()
        .flat_map(|arg| arg.split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|token| !token.is_empty())
        .collect_vec();
    match tokens.as_slice() {
        [single] if single.chars().count() == facelet::STICKER_COUNT => {
            single.chars().map(String::from).collect()
        }
        _ => tokens.into_iter().map(str::to_owned).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticker_forms() {
        let single = "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB".to_owned();
        assert_eq!(split_stickers(&[single]).len(), 54);

        let listed = split_stickers(&["White, Red,Green".to_owned(), "Blue".to_owned()]);
        assert_eq!(listed, ["White", "Red", "Green", "Blue"]);
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from([
            "cubelogic",
            "-vv",
            "solve",
            "--user",
            "alice",
            "--strategy",
            "first_solution",
            "UUUUUUUUULLLLLLLLLFFFFFFFFFRRRRRRRRRBBBBBBBBBDDDDDDDDD",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.strategy, Some(SearchStrategy::FirstSolution));
        assert!(matches!(cli.command, Commands::Solve { user, .. } if user == "alice"));

        assert!(Cli::try_parse_from(["cubelogic", "scramble", "R", "--random", "5"]).is_err());
        assert!(matches!(
            Cli::try_parse_from(["cubelogic", "profile", "--user", "bob"]).unwrap().command,
            Commands::Profile { user } if user == "bob"
        ));
    }
}

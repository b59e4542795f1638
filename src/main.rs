use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use connect_cascade::config::{check_level, AppConfig};
use connect_cascade::error::SessionError;
use connect_cascade::game::{GameKind, GameOutcome};
use connect_cascade::local::LocalMatch;
use connect_cascade::logging::setup_logging;
use connect_cascade::session::{
    join_room, list_open_rooms, login, open_room, register, Participant, SqliteStore,
    ThreadSleeper, Turn,
};

/// Play Classic or Cascade four-in-a-row in the terminal.
#[derive(Parser)]
#[command(name = "play", about = "Four-in-a-row: Classic and Cascade")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Two players taking turns at one terminal
    Local {
        /// Game to play: classic or cascade
        game: GameKind,
    },
    /// Play against the computer
    Cpu {
        /// Game to play: classic or cascade
        game: GameKind,
        /// Difficulty level (defaults to the configured one)
        #[arg(long)]
        level: Option<u8>,
    },
    /// Create an account for networked play
    Register(Credentials),
    /// List rooms waiting for a guest
    Rooms,
    /// Open a room and wait for a guest
    Host {
        #[command(flatten)]
        login: Credentials,
        #[arg(long)]
        room: String,
        #[arg(long)]
        room_password: String,
        #[arg(long, default_value = "classic")]
        game: GameKind,
    },
    /// Join a waiting room
    Join {
        #[command(flatten)]
        login: Credentials,
        #[arg(long)]
        room: String,
        #[arg(long)]
        room_password: String,
    },
}

#[derive(Args)]
struct Credentials {
    #[arg(long)]
    user: String,
    #[arg(long)]
    password: String,
}

enum Input {
    Column(usize),
    Quit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let _logger = setup_logging(&config.logging).context("starting logger")?;

    match cli.command {
        Command::Local { game } => run_local(LocalMatch::two_player(game)),
        Command::Cpu { game, level } => {
            let level = level.unwrap_or(match game {
                GameKind::Classic => config.ai.classic_level,
                GameKind::Cascade => config.ai.cascade_level,
            });
            check_level(game, level)?;
            run_local(LocalMatch::versus_cpu(game, level))
        }
        Command::Register(creds) => {
            let store = open_store(&config)?;
            register(&store, &creds.user, &creds.password)
                .with_context(|| format!("registering '{}'", creds.user))?;
            println!("Registered {}", creds.user);
            Ok(())
        }
        Command::Rooms => {
            let store = open_store(&config)?;
            let rooms = list_open_rooms(&store).context("listing rooms")?;
            if rooms.is_empty() {
                println!("No rooms are waiting for a guest");
            }
            for room in rooms {
                println!("{:<12} {:<8} hosted by {}", room.room_id, room.kind, room.host_id);
            }
            Ok(())
        }
        Command::Host {
            login: creds,
            room,
            room_password,
            game,
        } => {
            let store = open_store(&config)?;
            login(&store, &creds.user, &creds.password).context("logging in")?;
            let host = open_room(&store, &creds.user, &room, &room_password, game)
                .with_context(|| format!("opening room '{room}'"))?
                .with_poll_policy(config.session.poll_policy());
            println!("Room {room} is open, waiting for an opponent...");
            match host.wait_for_opponent(&mut ThreadSleeper) {
                Ok(view) => println!(
                    "{} joined",
                    view.guest_id.as_deref().unwrap_or("opponent")
                ),
                Err(e) => return finish_online(host, e),
            }
            run_online(host)
        }
        Command::Join {
            login: creds,
            room,
            room_password,
        } => {
            let store = open_store(&config)?;
            login(&store, &creds.user, &creds.password).context("logging in")?;
            let guest = join_room(&store, &creds.user, &room, &room_password)
                .with_context(|| format!("joining room '{room}'"))?
                .with_poll_policy(config.session.poll_policy());
            run_online(guest)
        }
    }
}

fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    let path = &config.session.database;
    SqliteStore::open(path).with_context(|| format!("opening session store {}", path.display()))
}

/// Read a column number from stdin. `None` on end of input.
fn read_input(prompt: &str) -> Result<Option<Input>> {
    let stdin = io::stdin();
    loop {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(Some(Input::Quit));
        }
        match line.parse() {
            Ok(column) => return Ok(Some(Input::Column(column))),
            Err(_) => println!("Enter a column number, or q to quit"),
        }
    }
}

fn describe(outcome: GameOutcome) -> String {
    match outcome {
        GameOutcome::Winner(player) => format!("{} wins!", player.name()),
        GameOutcome::Draw => "Draw.".to_string(),
    }
}

fn run_local(mut game: LocalMatch) -> Result<()> {
    loop {
        println!("\n{}", game.state());
        if let Some(outcome) = game.outcome() {
            println!("{}", describe(outcome));
            match read_input("Play again? (column number to start, q to quit) ")? {
                Some(Input::Column(_)) => {
                    game.reset();
                    continue;
                }
                _ => return Ok(()),
            }
        }

        if let Some(column) = game.cpu_turn()? {
            println!("CPU plays column {column}");
            continue;
        }

        let prompt = format!("{} > ", game.turn().name());
        match read_input(&prompt)? {
            Some(Input::Column(column)) => {
                if let Err(e) = game.play(column) {
                    println!("{e}");
                }
            }
            Some(Input::Quit) | None => return Ok(()),
        }
    }
}

fn run_online(me: Participant<'_, SqliteStore>) -> Result<()> {
    let mut sleeper = ThreadSleeper;
    loop {
        let view = match me.wait_for_turn(&mut sleeper) {
            Ok(Turn::Mine(view)) => view,
            Ok(Turn::Finished(view)) => {
                println!("\n{}", view.state);
                match view.winner_id() {
                    Some(winner) => println!("{winner} wins!"),
                    None => println!("Draw."),
                }
                return Ok(());
            }
            Err(e) => return finish_online(me, e),
        };

        println!("\n{}", view.state);
        loop {
            let prompt = format!("{} ({}) > ", me.identity(), me.seat().name());
            let column = match read_input(&prompt)? {
                Some(Input::Column(column)) => column,
                Some(Input::Quit) | None => {
                    me.leave().context("leaving room")?;
                    println!("Left the room");
                    return Ok(());
                }
            };
            match me.submit_move(column) {
                Ok(_) => break,
                Err(SessionError::InvalidMove(e)) => println!("{e}"),
                Err(e) => return finish_online(me, e),
            }
        }
        println!("Waiting for the opponent...");
    }
}

fn finish_online(me: Participant<'_, SqliteStore>, err: SessionError) -> Result<()> {
    match err {
        SessionError::SessionNotFound(room) => {
            println!("Room {room} was dissolved");
            Ok(())
        }
        SessionError::TimedOut(waited) => {
            info!("gave up on room {} after {waited:?}", me.room_id());
            me.leave().context("leaving room")?;
            println!("Nobody answered, room closed");
            Ok(())
        }
        other => Err(other).context("networked game failed"),
    }
}

//! Binary entrypoint for the Realm CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `play [--user <id>]` - play in the terminal, saving on exit
//! - `serve` - run the HTTP save/load and offline-experience service
//! - `offline --last-online <ms> [--rate <r>]` - print the offline experience calculation
//!
//! See the library crate docs for module-level details: `realm::`.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use realm::config::Config;
use realm::game::generation::ConfiguredGenerator;
use realm::game::interpreter::{GameRules, SystemClock};
use realm::game::progression::{offline_experience, offline_percentage};
use realm::game::{GameStore, Session, WorldData};
use realm::logutil::escape_log;

#[derive(Parser)]
#[command(name = "realm")]
#[command(about = "A Shan Hai Jing inspired text adventure")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Play in the terminal
    Play {
        /// Player id used for saving; a random one is generated when omitted
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Run the HTTP service
    Serve,
    /// Compute offline experience for a last-online timestamp
    Offline {
        /// Last time the player was online, epoch milliseconds
        #[arg(long)]
        last_online: i64,
        /// Experience per second; defaults to the configured rate
        #[arg(long)]
        rate: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = match Config::load(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} (using defaults; run `realm init` to create one)", e);
            Config::default()
        }
    };
    init_logging(&Some(config.clone()), cli.verbose);

    match cli.command {
        Commands::Init => {}
        Commands::Play { user } => play(&config, user).await?,
        Commands::Serve => {
            info!("Starting Realm v{}", env!("CARGO_PKG_VERSION"));
            realm::server::serve(&config).await?;
        }
        Commands::Offline { last_online, rate } => {
            let rate = rate.unwrap_or(config.game.offline_exp_rate);
            let now_ms = chrono::Utc::now().timestamp_millis();
            let gained = offline_experience(last_online, now_ms, rate);
            let payload = serde_json::json!({
                "gainedExp": format!("{:.2}", gained),
                "percentage": offline_percentage(gained, rate),
            });
            println!("{}", payload);
        }
    }

    Ok(())
}

async fn play(config: &Config, user: Option<String>) -> Result<()> {
    let user_id = user.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let store = GameStore::open(&config.storage.db_path)
        .with_context(|| format!("open save store at {}", config.storage.db_path))?;

    // An unreadable save is left untouched rather than replaced by a new game
    let snapshot = store.load_state(&user_id).with_context(|| {
        format!(
            "saved game for {} could not be read; refusing to start over it",
            user_id
        )
    })?;
    let world = WorldData::load_from_dir(&config.game.data_dir, &config.game.start_location);
    let mut session = Session::open(
        user_id.clone(),
        world,
        ConfiguredGenerator::from_config(&config.generation),
        SystemClock,
        GameRules::from(&config.game),
        snapshot,
    );

    println!("Playing as {}. Type \"quit\" to save and exit.", user_id);
    for line in session.greeting() {
        println!("{}", line);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        log::debug!("{}: {}", user_id, escape_log(trimmed));
        for out in session.handle(trimmed).await {
            println!("{}", out);
        }
    }

    session.save(&store).context("save game state")?;
    info!("Saved game for {}", user_id);
    println!("Game saved. Farewell, traveller.");
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // -v overrides the configured level
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Echo to the console only when attached to a terminal
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}

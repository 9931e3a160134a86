//! Binary entrypoint for the announcerd CLI.
//!
//! Commands:
//! - `start` - run the announcement loop against the configured dispatcher
//! - `init` - create a starter `config.toml`
//! - `status` - print pool counts and scheduling settings
//! - `add` / `add-temp` - add a permanent or temporary announcement
//! - `edit` / `delete` - modify or remove a stored announcement by index
//! - `list` - enumerate the current pool with provenance and indices
//!
//! See the library crate docs for module-level details: `announcerd::`.
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use announcerd::announcer::{Announcer, MessageStore, Provenance};
use announcerd::config::Config;
use announcerd::dispatch::{DeliveryOptions, LogDispatcher};

#[derive(Parser)]
#[command(name = "announcerd")]
#[command(about = "Periodic announcement broadcaster with rotating and temporary messages")]
#[command(after_help = "Management commands (add, add-temp, edit, delete) write the data \
files from this process. A daemon already running with `start` keeps its own copy of the \
store and rewrites those files on temporary-entry expiry, so stop it before editing from \
the command line, or restart it afterwards to pick up the changes.")]
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

/// Which mutable sub-store a management command targets.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum EntryKind {
    Permanent,
    Temporary,
}

impl From<EntryKind> for Provenance {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Permanent => Provenance::Permanent,
            EntryKind::Temporary => Provenance::Temporary,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the announcement loop
    Start,
    /// Initialize a new configuration file
    Init,
    /// Show pool counts and scheduling settings
    Status,
    /// Add a permanent announcement
    Add {
        /// Announcement text; use \n to separate lines
        #[arg(short, long)]
        text: String,
        /// Sound cue name for this announcement
        #[arg(short, long)]
        sound: Option<String>,
        /// Suppress the sound cue for this announcement
        #[arg(long)]
        silent: bool,
    },
    /// Add a temporary announcement that expires after a number of emissions
    AddTemp {
        /// Announcement text; use \n to separate lines
        #[arg(short, long)]
        text: String,
        /// How many times to emit before removal (minimum 1)
        #[arg(short = 'n', long, default_value_t = 1)]
        cycles: i64,
        /// Sound cue name for this announcement
        #[arg(short, long)]
        sound: Option<String>,
        /// Suppress the sound cue for this announcement
        #[arg(long)]
        silent: bool,
    },
    /// Replace a stored announcement in place
    Edit {
        /// Which list the announcement lives in
        #[arg(value_enum)]
        kind: EntryKind,
        /// Positional index within that list (see `list`)
        index: usize,
        /// Replacement text; use \n to separate lines
        #[arg(short, long)]
        text: String,
        /// Sound cue name for this announcement
        #[arg(short, long)]
        sound: Option<String>,
        /// Suppress the sound cue for this announcement
        #[arg(long)]
        silent: bool,
    },
    /// Delete a stored announcement; later indices shift down
    Delete {
        /// Which list the announcement lives in
        #[arg(value_enum)]
        kind: EntryKind,
        /// Positional index within that list (see `list`)
        index: usize,
    },
    /// List every announcement in the pool
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes it)
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load_or_init(&cli.config).await?,
            };
            info!("Starting announcerd v{}", env!("CARGO_PKG_VERSION"));

            let store = MessageStore::load(&config.storage.data_dir)?;
            let options = DeliveryOptions {
                prefix: config.settings.prefix.clone(),
                use_prefix: config.settings.use_prefix,
            };
            let interval = Duration::from_secs(config.settings.interval_seconds);
            let announcer = Arc::new(Mutex::new(Announcer::new(&config, store)));
            announcerd::service::run(announcer, LogDispatcher, interval, options).await?;
        }
        Commands::Init => {
            if tokio::fs::metadata(&cli.config).await.is_ok() {
                println!("Config file {} already exists; not overwriting.", cli.config);
            } else {
                Config::create_default(&cli.config).await?;
                println!("Wrote default configuration to {}", cli.config);
            }
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            let store = MessageStore::load(&config.storage.data_dir)?;
            let mode = if config.settings.random {
                "random"
            } else {
                "round-robin"
            };
            println!("announcerd v{}", env!("CARGO_PKG_VERSION"));
            println!("  interval:  {}s ({})", config.settings.interval_seconds, mode);
            println!(
                "  prefix:    {:?} ({})",
                config.settings.prefix,
                if config.settings.use_prefix { "on" } else { "off" }
            );
            println!("  static:    {}", config.announcements.len());
            println!("  permanent: {}", store.permanent().len());
            println!("  temporary: {}", store.temporary().len());
        }
        Commands::Add { text, sound, silent } => {
            let config = Config::load(&cli.config).await?;
            let mut store = MessageStore::load(&config.storage.data_dir)?;
            let index = store.add_permanent(split_lines(&text), !silent, sound)?;
            println!("Added permanent announcement at index {}.", index);
        }
        Commands::AddTemp {
            text,
            cycles,
            sound,
            silent,
        } => {
            let config = Config::load(&cli.config).await?;
            let mut store = MessageStore::load(&config.storage.data_dir)?;
            let index = store.add_temporary(split_lines(&text), cycles, !silent, sound)?;
            let stored = store.temporary()[index].remaining_cycles;
            println!(
                "Added temporary announcement at index {} (cycles: {}).",
                index, stored
            );
        }
        Commands::Edit {
            kind,
            index,
            text,
            sound,
            silent,
        } => {
            let config = Config::load(&cli.config).await?;
            let mut store = MessageStore::load(&config.storage.data_dir)?;
            store.edit(kind.into(), index, split_lines(&text), !silent, sound)?;
            println!("Announcement updated.");
        }
        Commands::Delete { kind, index } => {
            let config = Config::load(&cli.config).await?;
            let mut store = MessageStore::load(&config.storage.data_dir)?;
            store.delete(kind.into(), index)?;
            println!("Announcement deleted.");
        }
        Commands::List => {
            let config = Config::load(&cli.config).await?;
            let store = MessageStore::load(&config.storage.data_dir)?;
            let announcer = Announcer::new(&config, store);
            let pool = announcer.snapshot();
            if pool.is_empty() {
                println!("The announcement pool is empty.");
            } else {
                for item in &pool {
                    let label = match item.remaining_cycles {
                        Some(cycles) => format!("{} ({} cycles)", item.provenance, cycles),
                        None => item.provenance.to_string(),
                    };
                    println!("[{} #{}] {}", label, item.index, preview(&item.lines));
                }
            }
        }
    }

    Ok(())
}

/// Split raw management-surface input into announcement lines. The `\n`
/// delimiter is the literal two-character sequence, matching what users can
/// type into a single-line field; blank segments are dropped.
fn split_lines(raw: &str) -> Vec<String> {
    raw.split("\\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Short one-line preview of an announcement for listings.
fn preview(lines: &[String]) -> String {
    let mut out = lines
        .iter()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" | ");
    if lines.len() > 3 {
        out.push_str("...");
    }
    out
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);

    if let Some(file) = config.as_ref().and_then(|c| c.logging.file.clone()) {
        match std::fs::OpenOptions::new().create(true).append(true).open(&file) {
            Ok(f) => {
                builder.target(env_logger::Target::Pipe(Box::new(f)));
                builder.write_style(env_logger::WriteStyle::Never);
            }
            Err(e) => eprintln!("Cannot open log file {}: {} (logging to stderr)", file, e),
        }
    } else if !atty::is(atty::Stream::Stderr) {
        // Redirected output: skip ANSI color codes
        builder.write_style(env_logger::WriteStyle::Never);
    }

    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::{preview, split_lines};

    #[test]
    fn split_lines_handles_delimiters_and_blanks() {
        assert_eq!(split_lines("one\\ntwo"), vec!["one", "two"]);
        assert_eq!(split_lines("  solo  "), vec!["solo"]);
        assert_eq!(split_lines("a\\n\\n  \\nb"), vec!["a", "b"]);
        assert!(split_lines("\\n \\n").is_empty());
    }

    #[test]
    fn preview_truncates_after_three_lines() {
        let lines: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(preview(&lines), "a | b | c...");
        assert_eq!(preview(&lines[..2]), "a | b");
    }
}

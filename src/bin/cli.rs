//! flatseq CLI
//!
//! Opens a queue or stack file and runs a single operation against it.
//! Records are written to stdout, one per line; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use flatseq::config::{LockMode, SyncStrategy};
use flatseq::{Config, CursorWidth, DiskQueue, DiskStack, Record, Result, VacuumOutcome};
use tracing_subscriber::{fmt, EnvFilter};

/// Exit code when a get/pop/peek found nothing
const EXIT_EMPTY: u8 = 2;

/// flatseq CLI
#[derive(Parser, Debug)]
#[command(name = "flatseq")]
#[command(about = "Persistent flat-file queue and stack")]
#[command(version)]
struct Args {
    #[command(flatten)]
    options: FileOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct FileOptions {
    /// Cursor width in bits (must match the width the file was created with)
    #[arg(short, long, default_value = "32", global = true)]
    bits: u32,

    /// fsync after every mutating operation
    #[arg(long, global = true)]
    sync: bool,

    /// Do not take the exclusive file lock
    #[arg(long, global = true)]
    no_lock: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operate on a FIFO queue file
    Queue {
        /// Queue file
        file: PathBuf,

        #[command(subcommand)]
        op: QueueOp,
    },

    /// Operate on a LIFO stack file
    Stack {
        /// Stack file
        file: PathBuf,

        #[command(subcommand)]
        op: StackOp,
    },
}

#[derive(Subcommand, Debug)]
enum QueueOp {
    /// Append items to the tail
    Add {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Take items from the head
    Get {
        /// Number of items to take
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Reclaim space used by consumed items
    Vacuum {
        /// Skip unless at least this many consumed bytes can be reclaimed
        #[arg(long, default_value = "0")]
        min_stale: u64,
    },

    /// Show cursor and space usage
    Stats,
}

#[derive(Subcommand, Debug)]
enum StackOp {
    /// Push items (the last one ends up on top)
    Push {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Remove and print the top item
    Pop,

    /// Print the top item without removing it
    Peek,

    /// Print the number of items
    Depth,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,flatseq=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_EMPTY),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the command; `Ok(false)` means the structure had nothing to return
fn run(args: Args) -> Result<bool> {
    let config = build_config(&args.options)?;

    match args.command {
        Commands::Queue { file, op } => run_queue(file, op, config),
        Commands::Stack { file, op } => run_stack(file, op, config),
    }
}

fn build_config(options: &FileOptions) -> Result<Config> {
    let sync_strategy = if options.sync {
        SyncStrategy::EveryWrite
    } else {
        SyncStrategy::Never
    };
    let lock_mode = if options.no_lock {
        LockMode::None
    } else {
        LockMode::Exclusive
    };

    Ok(Config::builder()
        .cursor_width(CursorWidth::from_bits(options.bits)?)
        .sync_strategy(sync_strategy)
        .lock_mode(lock_mode)
        .build())
}

fn run_queue(file: PathBuf, op: QueueOp, mut config: Config) -> Result<bool> {
    if let QueueOp::Vacuum { min_stale } = &op {
        config.vacuum_min_stale_bytes = *min_stale;
    }
    let mut queue = DiskQueue::open(&file, config)?;

    match op {
        QueueOp::Add { items } => {
            queue.add_all(&items)?;
            tracing::info!("Added {} item(s) to {}", items.len(), file.display());
            Ok(true)
        }
        QueueOp::Get { count } => {
            let records = queue.get_many(count)?;
            print_records(&records);
            Ok(!records.is_empty())
        }
        QueueOp::Vacuum { .. } => {
            match queue.vacuum()? {
                VacuumOutcome::Unchanged => tracing::info!("Nothing to vacuum"),
                VacuumOutcome::Removed { reclaimed } => {
                    tracing::info!("Queue drained; removed file ({} bytes)", reclaimed)
                }
                VacuumOutcome::Compacted { reclaimed, retained } => tracing::info!(
                    "Reclaimed {} bytes, {} bytes still queued",
                    reclaimed,
                    retained
                ),
            }
            Ok(true)
        }
        QueueOp::Stats => {
            let stats = queue.stats()?;
            println!("file_size:     {}", stats.file_size);
            println!("cursor:        {}", stats.cursor);
            println!("stale_bytes:   {}", stats.stale_bytes);
            println!("pending_bytes: {}", stats.pending_bytes);
            Ok(true)
        }
    }
}

fn run_stack(file: PathBuf, op: StackOp, config: Config) -> Result<bool> {
    let mut stack = DiskStack::open(&file, config)?;

    match op {
        StackOp::Push { items } => {
            for item in &items {
                stack.push(item)?;
            }
            tracing::info!("Pushed {} item(s) onto {}", items.len(), file.display());
            Ok(true)
        }
        StackOp::Pop => print_optional(stack.pop()?),
        StackOp::Peek => print_optional(stack.peek()?),
        StackOp::Depth => {
            println!("{}", stack.depth()?);
            Ok(true)
        }
    }
}

fn print_records(records: &[Record]) {
    for record in records {
        println!("{}", record.to_string_lossy());
    }
}

fn print_optional(record: Option<Record>) -> Result<bool> {
    match record {
        Some(record) => {
            println!("{}", record.to_string_lossy());
            Ok(true)
        }
        None => Ok(false),
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tinstore::apps::{AuthStore, AuthView, CounterStore, CounterView};
use tinstore::config::Config;
use tinstore::middleware::{
    DevtoolsOptions, FileStorage, PersistOptions, StateStorage, TracingConnection,
};
use tinstore::view::{mount, Component, Mounted};

#[derive(Parser)]
#[command(name = "tinstore", version, about = "Run the store middleware demos in a terminal")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for persisted state
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    app: App,
}

#[derive(Subcommand)]
enum App {
    /// Counter reported to devtools (see TINSTORE_LOG)
    Counter {
        /// Do not report transitions
        #[arg(long)]
        no_devtools: bool,
    },
    /// Login toggle persisted to disk
    Auth {
        /// Forget the persisted state before starting
        #[arg(long)]
        reset: bool,
    },
}

fn main() -> Result<()> {
    tinstore::logging::init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = Some(dir);
    }

    match cli.app {
        App::Counter { no_devtools } => {
            let options = DevtoolsOptions {
                name: config.devtools.name.clone(),
                enabled: config.devtools.enabled && !no_devtools,
                ..DevtoolsOptions::default()
            };
            let store = CounterStore::with_devtools(TracingConnection, options);
            run(mount(CounterView::new(store)))
        }
        App::Auth { reset } => {
            let storage = FileStorage::new(config.storage_dir());
            tracing::info!(
                dir = %storage.dir().display(),
                key = %config.persist.key,
                "persisting auth state"
            );
            if reset {
                storage
                    .remove_item(&config.persist.key)
                    .context("failed to reset persisted auth state")?;
            }
            let options = PersistOptions::new(config.persist.key.clone())
                .version(config.persist.version);
            let store = AuthStore::persisted(storage, options);
            run(mount(AuthView::new(store)))
        }
    }
}

/// Print the current frame, read a control id, click it; repeat until
/// `quit` or end of input.
fn run<C: Component>(view: Mounted<C>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, "{}> ", view.frame())?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "" => continue,
            "q" | "quit" | "exit" => break,
            id => {
                if let Err(err) = view.click(id) {
                    writeln!(
                        stdout,
                        "{err}; available: {}",
                        view.frame().button_ids().join(", ")
                    )?;
                }
            }
        }
    }

    view.unmount();
    Ok(())
}

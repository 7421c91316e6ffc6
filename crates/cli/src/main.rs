mod config;
mod error;

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use runtime::{LlamaCppBackend, Pipeline, Session, ToolCatalog};
use storage::{Reading, SensorStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "toolwire.toml";

#[derive(Parser)]
#[command(name = "toolwire")]
#[command(about = "Tool-calling runtime for small chat models", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Send tool responses back to the model for a final answer
        #[arg(long)]
        feedback: bool,
    },
    /// Run one turn over model output, without a model
    Replay {
        /// Model output; read from stdin when omitted
        text: Option<String>,
        /// Print the whole turn as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the system prompt advertising the tool catalog
    Catalog {
        /// Print the tool list as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Inspect or append to the sensor log
    Sensors {
        #[command(subcommand)]
        action: SensorsCommand,
    },
    /// Watch the sensor log and let the model react to threshold crossings
    Monitor {
        /// Seconds between polls
        #[arg(short, long, default_value = "10")]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum SensorsCommand {
    /// Record a reading taken now
    Record {
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        pressure: Option<f64>,
        #[arg(long)]
        rain: Option<f64>,
    },
    /// Show the most recent reading
    Latest,
    /// List recent readings, newest first
    List {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;

    match cli.command.unwrap_or(Commands::Chat { feedback: false }) {
        Commands::Chat { feedback } => cmd_chat(&config, feedback).await,
        Commands::Replay { text, json } => cmd_replay(&config, text, json).await,
        Commands::Catalog { json } => cmd_catalog(&config, json),
        Commands::Sensors { action } => cmd_sensors(&config, action),
        Commands::Monitor { interval } => cmd_monitor(&config, interval).await,
    }
}

async fn cmd_chat(config: &Config, feedback: bool) -> Result<()> {
    println!("toolwire v{}", env!("CARGO_PKG_VERSION"));

    let backend = backend(config);
    println!("Model: {backend}");
    let store = open_store(config)?;
    let session = Session::new(backend, load_catalog(config)?, Arc::new(farm::registry(store)))
        .with_policy(config.policy.clone())
        .with_template(config.template.clone())
        .with_system(config.session.system_prompt.clone());
    let feedback = feedback || config.session.feedback;
    println!("Type 'quit' or Ctrl+D to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut history = Vec::new();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        let turn = session.handle_turn(input, &mut history).await;
        println!("\n{}\n", turn.message);

        if feedback {
            if let Some(answer) = session.feed_back(&mut history, &turn).await {
                println!("{}\n", answer.message);
            }
        }
    }

    println!("\nSession ended.");
    Ok(())
}

async fn cmd_replay(config: &Config, text: Option<String>, json: bool) -> Result<()> {
    let raw = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let store = open_store(config)?;
    let pipeline = Pipeline::new(load_catalog(config)?, Arc::new(farm::registry(store)))
        .with_policy(config.policy.clone())
        .with_template(config.template.clone());
    let turn = runtime::respond(&raw, &pipeline).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&turn)?);
    } else {
        println!("{}", turn.message);
    }
    Ok(())
}

fn cmd_catalog(config: &Config, json: bool) -> Result<()> {
    let catalog = load_catalog(config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog.to_json())?);
    } else {
        println!(
            "{}",
            catalog.system_prompt(&config.template, &config.session.system_prompt)
        );
    }
    Ok(())
}

fn cmd_sensors(config: &Config, action: SensorsCommand) -> Result<()> {
    let store = open_store(config)?;

    match action {
        SensorsCommand::Record {
            temperature,
            pressure,
            rain,
        } => {
            let id = store.record(&Reading {
                id: None,
                timestamp: Some(Local::now().naive_local()),
                temperature,
                pressure,
                rain,
            })?;
            println!("Recorded reading {id}.");
        }
        SensorsCommand::Latest => match store.latest()? {
            Some(reading) => print_readings(&[reading]),
            None => println!("No readings found."),
        },
        SensorsCommand::List { limit } => {
            let readings = store.recent(limit)?;
            if readings.is_empty() {
                println!("No readings found.");
            } else {
                print_readings(&readings);
            }
        }
    }
    Ok(())
}

async fn cmd_monitor(config: &Config, interval: u64) -> Result<()> {
    let store = open_store(config)?;
    let registry = Arc::new(farm::registry(Arc::clone(&store)));
    let mut monitor = farm::Monitor::new(
        backend(config),
        Arc::clone(&store),
        registry,
        farm::Thresholds::default(),
    )?
    .with_policy(config.policy.clone())
    .with_template(config.template.clone());

    info!(interval, database = %config.storage.database.display(), "monitoring sensor log");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        match monitor.poll().await {
            Ok(Some(turn)) => println!("{}", turn.message),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "could not read sensor log"),
        }
    }

    info!("monitor stopped");
    Ok(())
}

fn print_readings(readings: &[Reading]) {
    let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));

    println!(
        "{:<6}  {:<19}  {:>10}  {:>10}  {:>10}",
        "ID", "TIMESTAMP", "TEMP (C)", "PRES (bar)", "RAIN (mm)"
    );
    println!("{}", "-".repeat(63));
    for reading in readings {
        println!(
            "{:<6}  {:<19}  {:>10}  {:>10}  {:>10}",
            reading.id.map_or_else(String::new, |id| id.to_string()),
            reading.timestamp.map_or_else(
                || "-".to_string(),
                |ts| ts.format(storage::TIMESTAMP_FORMAT).to_string()
            ),
            show(reading.temperature),
            show(reading.pressure),
            show(reading.rain),
        );
    }
}

fn backend(config: &Config) -> LlamaCppBackend {
    LlamaCppBackend::builder(&config.backend.url)
        .max_tokens(config.backend.max_tokens)
        .temperature(config.backend.temperature)
        .template(config.template.clone())
        .build()
}

fn open_store(config: &Config) -> Result<Arc<SensorStore>> {
    Ok(Arc::new(SensorStore::open(&config.storage.database)?))
}

fn load_catalog(config: &Config) -> Result<Arc<ToolCatalog>> {
    let catalog = match &config.session.catalog {
        Some(path) => ToolCatalog::load(path)?,
        None => farm::default_catalog()?,
    };
    Ok(Arc::new(catalog))
}

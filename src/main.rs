use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use booking_lifecycle::{
    Booking, BookingEngine, BookingError, BookingId, Command, EngineConfig, LifecycleVisualization,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line driver for the booking lifecycle engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging (overridden by `RUST_LOG`)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON engine configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provider attached by `assign`
    #[arg(long, env = "BOOKING_PROVIDER_ID", global = true)]
    provider: Option<String>,

    /// What to run
    #[command(subcommand)]
    command: Mode,
}

/// Subcommands
#[derive(Subcommand, Debug)]
enum Mode {
    /// Walk through the reference lifecycle scenarios
    Demo,
    /// Print the transition table as a Graphviz DOT graph
    Graph {
        /// Write the graph to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a JSON script of booking steps and print the resulting bookings
    Run {
        /// Script file: a JSON array of steps
        script: PathBuf,
        /// Load bookings from this snapshot before running
        #[arg(long)]
        load: Option<PathBuf>,
        /// Save all bookings to this snapshot afterwards
        #[arg(long)]
        save: Option<PathBuf>,
        /// Fail with a non-zero exit status if any step is rejected
        #[arg(long)]
        strict: bool,
    },
}

/// One step of a script. Bookings are referred to by the alias given at
/// creation, or by id when they come from a loaded snapshot.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum Step {
    /// Create a booking and remember it under `alias`
    Create {
        /// Name used by later steps
        alias: String,
        /// Customer who requested the service
        customer_name: String,
        /// Kind of service requested
        service_type: String,
    },
    /// Assign a provider
    Assign {
        /// Alias or id
        booking: String,
    },
    /// Provider accepts
    Accept {
        /// Alias or id
        booking: String,
    },
    /// Provider rejects
    Reject {
        /// Alias or id
        booking: String,
    },
    /// Provider completes
    Complete {
        /// Alias or id
        booking: String,
    },
    /// Customer cancels
    Cancel {
        /// Alias or id
        booking: String,
    },
    /// Retry a failed booking
    Retry {
        /// Alias or id
        booking: String,
    },
    /// Administrative override
    Override {
        /// Alias or id
        booking: String,
        /// Target status name
        status: String,
    },
}

/// Parse arguments, run the selected mode and map errors to a failing exit status
fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(message) => {
            error!("{message}");
            eprintln!("{} {message}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Install the fmt subscriber, honouring `RUST_LOG` when set
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Build the configuration from the optional file and CLI overrides
fn load_config(args: &Args) -> Result<EngineConfig, String> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    if let Some(provider) = &args.provider {
        config = config.with_default_provider(provider.clone());
    }
    Ok(config)
}

/// Dispatch the selected subcommand
fn run(args: Args) -> Result<ExitCode, String> {
    let config = load_config(&args)?;
    match args.command {
        Mode::Demo => {
            demo(&config);
            Ok(ExitCode::SUCCESS)
        }
        Mode::Graph { output } => {
            let dot = LifecycleVisualization::generate_dot(None);
            match output {
                Some(path) => {
                    LifecycleVisualization::save_dot_to_file(&dot, &path).map_err(|e| e.to_string())?;
                    info!(path = %path.display(), "graph written");
                }
                None => print!("{dot}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Mode::Run { script, load, save, strict } => {
            run_script(&config, &script, load.as_deref(), save.as_deref(), strict)
        }
    }
}

/// Print the outcome of one call
fn report(label: &str, result: &Result<Booking, BookingError>) {
    match result {
        Ok(booking) => println!(
            "  {:<28} {} (history: {})",
            label,
            booking.status().to_string().green(),
            booking.history().len()
        ),
        Err(e) => println!("  {:<28} {}", label, e.to_string().red()),
    }
}

/// Run the reference scenarios against a fresh engine
fn demo(config: &EngineConfig) {
    let engine = BookingEngine::new(config);

    println!("{}", "Booking Lifecycle Demonstration".green().bold());
    println!("===============================\n");

    println!("{}", "A: full lifecycle".yellow().bold());
    let a = engine.create_booking("Alice", "Plumbing");
    println!("  created {} for {}", a.id(), a.customer_name());
    report("assign", &engine.assign(a.id()));
    report("accept", &engine.accept(a.id()));
    report("complete", &engine.complete(a.id()));

    println!("\n{}", "B: reject and retry".yellow().bold());
    let b = engine.create_booking("Bob", "Electrical");
    report("reject", &engine.reject(b.id()));
    report("retry", &engine.retry(b.id()));

    println!("\n{}", "C: accept before assign".yellow().bold());
    let c = engine.create_booking("Carol", "Cleaning");
    report("accept", &engine.accept(c.id()));

    println!("\n{}", "D: admin override".yellow().bold());
    let d = engine.create_booking("Dan", "Painting");
    report("override COMPLETED", &engine.override_status(d.id(), "COMPLETED"));

    println!("\n{}", "E: override with unknown status".yellow().bold());
    let e = engine.create_booking("Erin", "Moving");
    report("override BOGUS", &engine.override_status(e.id(), "BOGUS"));

    if let Ok(booking) = engine.get(a.id()) {
        println!("\n{}", "History of booking A".yellow().bold());
        print!("{}", LifecycleVisualization::history_table(booking.history()));
    }

    println!("\n{}", "Statistics".yellow().bold());
    print!("{}", LifecycleVisualization::stats_table(&engine.stats()));

    println!("\n{}", "Demonstration complete!".green().bold());
}

/// Resolve a script reference to a booking id
fn resolve(aliases: &HashMap<String, BookingId>, reference: &str) -> Result<BookingId, String> {
    aliases
        .get(reference)
        .copied()
        .or_else(|| reference.parse().ok())
        .ok_or_else(|| format!("unknown booking reference {reference:?}"))
}

/// Turn a script step into an engine command
fn to_command(aliases: &HashMap<String, BookingId>, step: Step) -> Result<Command, String> {
    Ok(match step {
        Step::Create { customer_name, service_type, .. } => Command::Create { customer_name, service_type },
        Step::Assign { booking } => Command::Assign { id: resolve(aliases, &booking)? },
        Step::Accept { booking } => Command::Accept { id: resolve(aliases, &booking)? },
        Step::Reject { booking } => Command::Reject { id: resolve(aliases, &booking)? },
        Step::Complete { booking } => Command::Complete { id: resolve(aliases, &booking)? },
        Step::Cancel { booking } => Command::Cancel { id: resolve(aliases, &booking)? },
        Step::Retry { booking } => Command::Retry { id: resolve(aliases, &booking)? },
        Step::Override { booking, status } => {
            Command::Override { id: resolve(aliases, &booking)?, status }
        }
    })
}

/// Apply a script and print every booking as JSON
fn run_script(
    config: &EngineConfig,
    script: &Path,
    load: Option<&Path>,
    save: Option<&Path>,
    strict: bool,
) -> Result<ExitCode, String> {
    let engine = match load {
        Some(path) => BookingEngine::load_snapshot(path, config).map_err(|e| e.to_string())?,
        None => BookingEngine::new(config),
    };

    let contents = fs::read_to_string(script).map_err(|e| format!("cannot read script: {e}"))?;
    let steps: Vec<Step> =
        serde_json::from_str(&contents).map_err(|e| format!("invalid script: {e}"))?;

    let (_, rejected) = apply_steps(&engine, steps);

    let bookings = serde_json::to_string_pretty(&engine.list()).map_err(|e| e.to_string())?;
    println!("{bookings}");

    if let Some(path) = save {
        engine.save_snapshot(path).map_err(|e| e.to_string())?;
    }

    info!(bookings = engine.len(), rejected, "script finished");
    Ok(exit_code(strict, rejected))
}

/// Run every step in order, carrying on past rejected ones.
///
/// Returns the aliases created along the way and the number of rejected steps.
fn apply_steps(engine: &BookingEngine, steps: Vec<Step>) -> (HashMap<String, BookingId>, usize) {
    let mut aliases = HashMap::new();
    let mut rejected = 0_usize;
    for (index, step) in steps.into_iter().enumerate() {
        let alias = match &step {
            Step::Create { alias, .. } => Some(alias.clone()),
            _ => None,
        };
        let outcome = to_command(&aliases, step).and_then(|command| {
            engine.execute(command).map_err(|e| e.to_string())
        });
        match outcome {
            Ok(booking) => {
                if let Some(alias) = alias {
                    aliases.insert(alias, booking.id());
                }
            }
            Err(message) => {
                rejected = rejected.saturating_add(1);
                eprintln!("{} step {}: {message}", "rejected".yellow(), index.saturating_add(1));
            }
        }
    }
    (aliases, rejected)
}

/// Exit status of a finished script
fn exit_code(strict: bool, rejected: usize) -> ExitCode {
    if strict && rejected > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use booking_lifecycle::BookingStatus;

    use super::*;

    /// Decode a script from its JSON text
    fn steps(json: &str) -> Vec<Step> {
        serde_json::from_str(json).expect("valid script")
    }

    /// Engine without the logging observers
    fn quiet_engine() -> BookingEngine {
        BookingEngine::new(&EngineConfig::default().with_builtin_observers(false))
    }

    /// Write `script` to a fresh temporary file
    fn script_file(script: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("booking-script-{}.json", BookingId::new()));
        fs::write(&path, script).expect("write script");
        path
    }

    #[test]
    fn resolve_prefers_aliases_then_ids() {
        let known = BookingId::new();
        let aliases = HashMap::from([("alice".to_string(), known)]);

        assert_eq!(resolve(&aliases, "alice"), Ok(known));
        let other = BookingId::new();
        assert_eq!(resolve(&aliases, &other.to_string()), Ok(other));
        assert!(resolve(&aliases, "bob").is_err());
    }

    #[test]
    fn unknown_alias_is_rejected_before_reaching_the_engine() {
        let aliases = HashMap::new();
        let step = steps(r#"[{"op": "assign", "booking": "ghost"}]"#).pop().expect("one step");
        let result = to_command(&aliases, step).map(|_| ());
        assert_eq!(result, Err(r#"unknown booking reference "ghost""#.to_string()));
    }

    #[test]
    fn script_continues_after_a_rejected_step() {
        let engine = quiet_engine();
        let script = steps(
            r#"[
                {"op": "create", "alias": "a", "customerName": "Alice", "serviceType": "Plumbing"},
                {"op": "accept", "booking": "ghost"},
                {"op": "accept", "booking": "a"},
                {"op": "assign", "booking": "a"},
                {"op": "override", "booking": "a", "status": "BOGUS"},
                {"op": "accept", "booking": "a"}
            ]"#,
        );

        let (aliases, rejected) = apply_steps(&engine, script);
        assert_eq!(rejected, 3);
        let id = aliases.get("a").copied().expect("alias recorded");
        let booking = engine.get(id).expect("booking exists");
        assert_eq!(booking.status(), BookingStatus::InProgress);
        assert_eq!(booking.history().len(), 3);
    }

    #[test]
    fn strict_mode_fails_only_when_something_was_rejected() {
        assert_eq!(exit_code(true, 1), ExitCode::FAILURE);
        assert_eq!(exit_code(true, 0), ExitCode::SUCCESS);
        assert_eq!(exit_code(false, 1), ExitCode::SUCCESS);
    }

    #[test]
    fn strict_script_run_reports_failure() {
        let path = script_file(
            r#"[
                {"op": "create", "alias": "a", "customerName": "Alice", "serviceType": "Plumbing"},
                {"op": "retry", "booking": "a"}
            ]"#,
        );

        let config = EngineConfig::default().with_builtin_observers(false);
        let strict = run_script(&config, &path, None, None, true);
        let lenient = run_script(&config, &path, None, None, false);
        drop(fs::remove_file(&path));

        assert_eq!(strict, Ok(ExitCode::FAILURE));
        assert_eq!(lenient, Ok(ExitCode::SUCCESS));
    }

    #[test]
    fn malformed_script_is_an_error() {
        let path = script_file(r#"[{"op": "teleport"}]"#);

        let config = EngineConfig::default().with_builtin_observers(false);
        let result = run_script(&config, &path, None, None, false);
        drop(fs::remove_file(&path));
        assert!(result.is_err_and(|message| message.starts_with("invalid script")));
    }
}

use std::env;
use std::fs;
use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use propdesk_core::config::Config;
use propdesk_core::PersonaId;
use propdesk_core::PersonaTable;
use propdesk_exec::cues::BellCues;
use propdesk_exec::shell::DesktopShell;
use propdesk_exec::timers::FeedLatency;
use tracing_subscriber::EnvFilter;

mod ui;

const LOG_ENV: &str = "PROPDESK_LOG";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("propdesk {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "personas" => {
            for persona in PersonaId::ALL {
                let table = PersonaTable::builtin(persona)?;
                println!("{:<12}{}", persona.id(), table.title);
            }
            Ok(())
        }
        "tables" => {
            let opts = parse_run_args(args.collect())?;
            init_logging(None);
            let config = load_config(opts.config.as_deref())?;
            let persona = resolve_persona(&opts, &config)?;
            let table = PersonaTable::load(persona, config.shell.persona_dir.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&table)?);
            Ok(())
        }
        "run" => {
            let opts = parse_run_args(args.collect())?;
            let config = load_config(opts.config.as_deref())?;
            let persona = resolve_persona(&opts, &config)?;
            init_logging(log_file_path().as_deref());
            let latency = match opts.seed {
                Some(seed) => FeedLatency::seeded(seed),
                None => FeedLatency::from_entropy(),
            };
            let shell = DesktopShell::for_persona(
                persona,
                &config,
                Box::new(BellCues::new(io::stdout())),
                latency,
            )?;
            ui::run(shell)
        }
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RunArgs {
    persona: Option<PersonaId>,
    config: Option<PathBuf>,
    seed: Option<u64>,
}

fn parse_run_args(args: Vec<String>) -> Result<RunArgs, Box<dyn std::error::Error>> {
    let mut opts = RunArgs::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let Some(value) = args.get(i + 1) else {
            return Err(format!("{flag} requires a value").into());
        };
        match flag {
            "--persona" => {
                let persona = PersonaId::from_id(value)
                    .ok_or_else(|| format!("unknown persona: {value}"))?;
                opts.persona = Some(persona);
            }
            "--config" => opts.config = Some(PathBuf::from(value)),
            "--seed" => {
                let seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("--seed expects an integer, got {value}"))?;
                opts.seed = Some(seed);
            }
            other => {
                return Err(format!("unsupported argument: {other}").into());
            }
        }
        i += 2;
    }
    Ok(opts)
}

fn resolve_persona(opts: &RunArgs, config: &Config) -> Result<PersonaId, Box<dyn std::error::Error>> {
    opts.persona
        .or(config.shell.default_persona)
        .ok_or_else(|| "no persona selected: pass --persona or set shell.default_persona".into())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("propdesk").join("config.toml"))
}

/// An explicit path must exist; the default location is optional.
fn load_config(explicit: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(Config::default()),
        },
    };
    let text = fs::read_to_string(&path)
        .map_err(|err| format!("failed to read config {}: {err}", path.display()))?;
    let config = toml::from_str(&text)
        .map_err(|err| format!("invalid config {}: {err}", path.display()))?;
    Ok(config)
}

fn log_file_path() -> Option<PathBuf> {
    let dir = dirs::data_dir()?.join("propdesk");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join("propdesk.log"))
}

/// Logs go to `file` when given (the TUI owns the terminal), to stderr
/// otherwise. Without a usable file nothing is logged.
fn init_logging(file: Option<&Path>) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let result = match file {
        Some(path) => match File::options().create(true).append(true).open(path) {
            Ok(file) => builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init(),
            Err(_) => return,
        },
        None => builder.with_writer(io::stderr).try_init(),
    };
    if let Err(err) = result {
        eprintln!("logging disabled: {err}");
    }
}

fn print_help() {
    println!("propdesk {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  propdesk run [--persona ID] [--config PATH] [--seed N]");
    println!("  propdesk personas");
    println!("  propdesk tables --persona ID [--config PATH]");
    println!("  propdesk --help");
    println!("  propdesk --version");
    println!();
    println!("Personas: child, engineer, guard, programmer, lawyer");
    println!("Log filter: {LOG_ENV} (default: warn)");
}

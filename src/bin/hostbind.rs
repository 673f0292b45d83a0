//! CLI for binding schemas
//!
//! Usage: hostbind [options] <command> <schema.idl> [expr...]
//!
//! Commands:
//!   gen      Print the generated Rust bindings module
//!   meta     Print binding metadata as JSON
//!   check    Verify the metadata against the lowering contract
//!   lower    Translate and lower each binding expression to host source
//!
//! Options:
//!   --config <file>    JSON lowering configuration
//!   --target <name>    Default target for static members ("none" for bare names)
//!   --reject-instanceof
//!                      Treat instanceof on opaque types as an error

use std::env;
use std::path::PathBuf;

use hostbind::{Bindings, InstanceOfPolicy, LoweringConfig};
use log::debug;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Gen,
    Meta,
    Check,
    Lower,
}

/// CLI configuration
struct Config {
    command: Command,
    schema_path: PathBuf,
    config_path: Option<PathBuf>,
    target: Option<String>,
    reject_instanceof: bool,
    expressions: Vec<String>,
}

fn usage(program_name: &str) -> String {
    format!(
        "Usage: {} [--config <file>] [--target <name>] [--reject-instanceof] <gen|meta|check|lower> <schema> [expr...]",
        program_name
    )
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map_or("hostbind", |s| s.as_str());

    let mut config_path = None;
    let mut target = None;
    let mut reject_instanceof = false;
    let mut positional: Vec<&str> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        let Some(arg) = args.get(i) else {
            break;
        };
        if arg == "--config" {
            i += 1;
            config_path = Some(PathBuf::from(
                args.get(i)
                    .ok_or_else(|| "--config requires a file".to_string())?,
            ));
        } else if arg == "--target" {
            i += 1;
            target = Some(
                args.get(i)
                    .ok_or_else(|| "--target requires a name".to_string())?
                    .clone(),
            );
        } else if arg == "--reject-instanceof" {
            reject_instanceof = true;
        } else if arg == "--help" || arg == "-h" {
            return Err(usage(program_name));
        } else if arg.starts_with("--") {
            return Err(format!("Unknown option: {}", arg));
        } else {
            positional.push(arg);
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    let command = match positional.next() {
        Some("gen") => Command::Gen,
        Some("meta") => Command::Meta,
        Some("check") => Command::Check,
        Some("lower") => Command::Lower,
        Some(other) => return Err(format!("Unknown command: {}\n{}", other, usage(program_name))),
        None => return Err(usage(program_name)),
    };
    let schema_path = positional
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| usage(program_name))?;
    let expressions: Vec<String> = positional.map(str::to_string).collect();

    if command == Command::Lower && expressions.is_empty() {
        return Err("lower needs at least one binding expression".to_string());
    }

    Ok(Config {
        command,
        schema_path,
        config_path,
        target,
        reject_instanceof,
        expressions,
    })
}

fn lowering_config(cli: &Config) -> Result<LoweringConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config_path {
        Some(path) => LoweringConfig::load(path)?,
        None => LoweringConfig::default(),
    };
    // Flags override the file
    if let Some(target) = &cli.target {
        config.default_target = match target.as_str() {
            "none" | "" => None,
            name => Some(name.to_string()),
        };
    }
    if cli.reject_instanceof {
        config.instanceof = InstanceOfPolicy::Reject;
    }
    config.validate()?;
    debug!("lowering config: {:?}", config);
    Ok(config)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_args().map_err(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    })?;

    let config = lowering_config(&cli)?;
    let bindings = Bindings::load(&cli.schema_path, config)?;
    debug!(
        "loaded {} interfaces from {}",
        bindings.schema().len(),
        cli.schema_path.display()
    );

    match cli.command {
        Command::Gen => print!("{}", bindings.rust()),
        Command::Meta => println!("{}", bindings.metadata().to_json()?),
        Command::Check => {
            let violations = bindings.check();
            if !violations.is_empty() {
                for violation in &violations {
                    eprintln!("{}", violation);
                }
                return Err(format!("{} contract violation(s)", violations.len()).into());
            }
            println!("ok: {} interfaces", bindings.schema().len());
        }
        Command::Lower => {
            for source in &cli.expressions {
                println!("{}", bindings.lower(source)?);
            }
        }
    }

    Ok(())
}

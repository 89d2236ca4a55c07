use std::{fmt::Write, path::PathBuf, process::ExitCode};

use clap::Parser;
use sandbox_rlm::{RlmConfig, Signature, Signatures, build_signatures};
use tracing_subscriber::EnvFilter;

/// Print the instructions and fields a reasoning loop would send to the model
/// for a task run in the sandbox.
#[derive(Parser, Debug)]
#[command(name = "sandbox-rlm", version, about)]
struct Cli {
    /// Task signature, e.g. "inventory, today -> expiring_soon: list[str]"
    signature: String,

    /// Task instructions; defaults to a generic description of the fields
    #[arg(short, long)]
    instructions: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the extract signature instead of the action signature
    #[arg(long)]
    extract: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let signature = match cli.signature.parse::<Signature>() {
        Ok(signature) => signature.with_instructions(cli.instructions.unwrap_or_default()),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let config = match cli.config.map(RlmConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%signature, tools = config.tools.len(), "building signatures");

    let Signatures { action, extract } = build_signatures(&signature, &config, &config.tools);
    print!("{}", render(if cli.extract { &extract } else { &action }));
    ExitCode::SUCCESS
}

fn render(signature: &Signature) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", signature.instructions());
    for (heading, fields) in [("Inputs", signature.inputs()), ("Outputs", signature.outputs())] {
        let _ = writeln!(out, "{heading}:");
        for field in fields {
            match &field.desc {
                Some(desc) => {
                    let _ = writeln!(out, "- {}: {} ({desc})", field.name, field.ty);
                }
                None => {
                    let _ = writeln!(out, "- {}: {}", field.name, field.ty);
                }
            }
        }
    }
    out
}

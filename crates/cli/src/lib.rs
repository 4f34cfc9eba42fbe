pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "agentic",
    about = "Agentic user directory operator CLI",
    long_about = "Apply migrations, check runtime readiness, and send prompts to the user-management agent.",
    after_help = "Examples:\n  agentic migrate\n  agentic doctor --json\n  agentic ask --offline \"list users\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Validate config, database connectivity, and model endpoint settings")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Send one natural-language prompt to the agent and print its reply")]
    Ask {
        #[arg(help = "Prompt text, English or Arabic")]
        prompt: String,
        #[arg(long, help = "Skip the language model and answer with the rule-based agent")]
        offline: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ask { prompt, offline } => commands::ask::run(&prompt, offline),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

mod grade_cmd;
mod history_cmd;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use promptgrade::config::Config;
use promptgrade::history::HistoryBackend;

#[derive(Parser)]
#[command(
    name = "promptgrade",
    about = "Prompt grader — score prompt quality with an LLM and keep a local history"
)]
struct Cli {
    /// History backend (overrides config and PROMPTGRADE_BACKEND)
    #[arg(long, global = true)]
    backend: Option<HistoryBackend>,

    /// Log grading and storage details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a prompt (from the argument, --file, or stdin)
    Grade(GradeArgs),
    /// Inspect and manage saved results
    #[command(subcommand)]
    History(HistoryCommands),
}

#[derive(Args)]
pub struct GradeArgs {
    /// Prompt text to grade
    prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(long, short = 'f', conflicts_with = "prompt")]
    file: Option<PathBuf>,

    /// Model name (e.g. gpt-4, gpt-4o, gpt-3.5-turbo); defaults to config
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Sampling temperature between 0.0 and 1.0; defaults to config
    #[arg(long, short = 't', value_parser = parse_temperature)]
    temperature: Option<f64>,

    /// Use the local mock grader, never call the API
    #[arg(long, conflicts_with = "no_mock")]
    mock: bool,

    /// Call the API even when no key is configured
    #[arg(long)]
    no_mock: bool,

    /// API key for this call (overrides OPENAI_API_KEY and config)
    #[arg(long, conflicts_with = "ask_key")]
    api_key: Option<String>,

    /// Prompt for the API key without echoing it
    #[arg(long)]
    ask_key: bool,

    /// Save the result to history
    #[arg(long, short = 's')]
    save: bool,

    /// Show the raw diagnostic data
    #[arg(long)]
    raw: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List saved results, newest first
    List {
        /// Maximum entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one saved result
    Show {
        id: String,
        /// Print the entry as JSON
        #[arg(long)]
        json: bool,
        /// Include the raw diagnostic data
        #[arg(long)]
        raw: bool,
    },
    /// Write one saved result as pretty JSON (stdout unless --output)
    Export {
        id: String,
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Delete one saved result
    Delete { id: String },
}

fn parse_temperature(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("{s:?} is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("temperature must be between 0.0 and 1.0, got {value}"))
    }
}

fn main() {
    let cli = Cli::parse();
    promptgrade::init_logging(cli.verbose);

    let mut config = Config::load();
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }
    tracing::debug!("config: {config:?}");

    let exit_code = match &cli.command {
        Commands::Grade(args) => grade_cmd::cmd_grade(args, &config).unwrap_or_else(|e| {
            eprintln!("[promptgrade] error: {e:#}");
            1
        }),
        Commands::History(HistoryCommands::List { limit }) => {
            history_cmd::cmd_history_list(&config, *limit)
        }
        Commands::History(HistoryCommands::Show { id, json, raw }) => {
            history_cmd::cmd_history_show(&config, id, *json, *raw)
        }
        Commands::History(HistoryCommands::Export { id, output }) => {
            history_cmd::cmd_history_export(&config, id, output.as_deref())
        }
        Commands::History(HistoryCommands::Delete { id }) => {
            history_cmd::cmd_history_delete(&config, id)
        }
    };
    std::process::exit(exit_code);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn temperature_bounds_are_inclusive() {
        assert_eq!(parse_temperature("0"), Ok(0.0));
        assert_eq!(parse_temperature("1.0"), Ok(1.0));
        assert!(parse_temperature("1.01").is_err());
        assert!(parse_temperature("-0.1").is_err());
        assert!(parse_temperature("warm").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn model_help_lists_suggested_models() {
        use clap::CommandFactory;
        let mut cmd = Cli::command();
        let grade = cmd.find_subcommand_mut("grade").unwrap();
        let help = grade.render_long_help().to_string();
        for model in ["gpt-4", "gpt-4o", "gpt-3.5-turbo"] {
            assert!(help.contains(model), "{model} missing from: {help}");
        }
    }
}

use std::io::{IsTerminal as _, Read as _};

use anyhow::Context as _;

use promptgrade::config::Config;
use promptgrade::grade::{GradeRequest, Grader, MockPolicy};
use promptgrade::render;

use crate::GradeArgs;
use crate::history_cmd;

fn read_prompt(args: &GradeArgs) -> anyhow::Result<String> {
    if let Some(prompt) = &args.prompt {
        return Ok(prompt.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt file: {}", path.display()));
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("no prompt given — pass it as an argument, with --file, or on stdin");
    }
    let mut prompt = String::new();
    stdin
        .lock()
        .read_to_string(&mut prompt)
        .context("failed to read prompt from stdin")?;
    Ok(prompt)
}

fn ask_api_key() -> anyhow::Result<String> {
    dialoguer::Password::new()
        .with_prompt("OpenAI API key (leave empty to use the configured key)")
        .allow_empty_password(true)
        .interact()
        .context("failed to read API key")
}

const fn mock_policy(args: &GradeArgs) -> MockPolicy {
    if args.mock {
        MockPolicy::Always
    } else if args.no_mock {
        MockPolicy::Never
    } else {
        MockPolicy::Auto
    }
}

pub fn cmd_grade(args: &GradeArgs, config: &Config) -> anyhow::Result<i32> {
    let prompt = read_prompt(args)?;
    let api_key = if args.ask_key {
        Some(ask_api_key()?)
    } else {
        args.api_key.clone()
    };
    let model = args.model.as_deref().unwrap_or(&config.grader.model);
    let temperature = args.temperature.unwrap_or(config.grader.temperature);

    let grader = Grader::from_settings(&config.grader).unwrap_or_else(|e| {
        tracing::warn!("grader unavailable ({e:#}), falling back to mock scoring");
        Grader::new(None)
    });
    let result = grader.grade(&GradeRequest {
        prompt: &prompt,
        model,
        temperature,
        mock: mock_policy(args),
        api_key: api_key.as_deref(),
    });

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("serialize result")?
        );
    } else {
        print!("{}", render::format_result(&result, args.raw));
        println!("\n{}", render::HINT);
    }

    if args.save {
        let store = history_cmd::store_for(config)?;
        let entry = store.save(&prompt, model, temperature, result)?;
        eprintln!("[promptgrade] saved as {}", entry.id);
    }
    Ok(0)
}

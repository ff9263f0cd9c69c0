//! mit_ai_studio command-line entry points.
//!
//! ```bash
//! mit_ai_studio run
//! mit_ai_studio train 3 trained_agents_data.json
//! mit_ai_studio replay research_task
//! mit_ai_studio test 2 gpt-4o
//! ```
//!
//! See [`mit_ai_studio::config`] for the environment variables.

use clap::{Parser, Subcommand};

use mit_ai_studio::inputs::current_year;
use mit_ai_studio::{entry, Crew, StudioConfig};

#[derive(Debug, Parser)]
#[command(name = "mit_ai_studio", version, about = "Run, train, replay or test the studio crew")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prompt for a request and run the crew.
    Run,
    /// Train the crew for a number of iterations.
    Train {
        n_iterations: u32,
        filename: String,
    },
    /// Replay the last kickoff from a specific task.
    Replay { task_id: String },
    /// Test the crew and print the evaluation scores.
    Test {
        n_iterations: u32,
        eval_llm: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mit_ai_studio::logging::init_tracing();
    let cli = Cli::parse();

    let config = StudioConfig::from_env();
    tracing::debug!(?config, "resolved configuration");
    let crew = Crew::from_config(&config)?;

    match cli.command {
        Command::Run => {
            let stdin = std::io::stdin();
            let output = entry::run(
                &crew,
                &config.preference_path(),
                current_year(),
                &mut stdin.lock(),
                &mut std::io::stdout(),
            )
            .await?;
            println!("{}", output);
        }
        Command::Train {
            n_iterations,
            filename,
        } => {
            entry::train(&crew, n_iterations, &filename, current_year()).await?;
        }
        Command::Replay { task_id } => {
            let output = entry::replay(&crew, &task_id).await?;
            println!("{}", output);
        }
        Command::Test {
            n_iterations,
            eval_llm,
        } => {
            let report = entry::test(&crew, n_iterations, &eval_llm, current_year()).await?;
            println!("{}", report);
        }
    }

    Ok(())
}

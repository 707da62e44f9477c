use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::assessment::{AssessmentRequest, Assessor};
use crate::auth::Token;
use crate::github::{GitHubClient, GitHubToolKind, DEFAULT_API_URL};
use crate::llm::{GeminiModel, DEFAULT_LLM_URL, DEFAULT_MODEL};
use crate::prompt::{Intensity, Persona};
use crate::server::{self, AppState};

const CHUNK_BUFFER: usize = 32;

#[derive(Parser)]
#[command(name = "ghassess")]
#[command(author, version, about = "Persona-driven GitHub profile assessments", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Args)]
struct GitHubArgs {
    /// GitHub personal access token
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// GitHub API base URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    github_url: String,
}

impl GitHubArgs {
    fn client(&self) -> Result<GitHubClient> {
        let token = Token::require(&self.token, "GitHub token")?;
        Ok(GitHubClient::new(&self.github_url, token)?)
    }
}

#[derive(Args)]
struct LlmArgs {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model used for generation
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Generative Language API base URL
    #[arg(long, default_value = DEFAULT_LLM_URL)]
    llm_url: String,
}

impl LlmArgs {
    fn model(&self) -> Result<GeminiModel> {
        let api_key = Token::require(&self.api_key, "Gemini API key")?;
        Ok(GeminiModel::new(&self.llm_url, &self.model, api_key)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Stream an assessment of a GitHub user to stdout
    Assess {
        /// GitHub username to assess
        username: String,

        /// Persona the assessment is written as
        #[arg(short = 'P', long, value_enum, default_value_t = Persona::default())]
        personality: Persona,

        /// Intensity from 1 (gentle) to 5 (merciless)
        #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
        intensity: u8,

        #[command(flatten)]
        github: GitHubArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Serve assessments as a callable HTTP endpoint
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: String,

        #[command(flatten)]
        github: GitHubArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Run a single GitHub fetcher and print its JSON result
    Fetch {
        /// Fetcher to run
        #[arg(value_enum)]
        tool: GitHubToolKind,

        /// GitHub username to look up
        username: String,

        #[command(flatten)]
        github: GitHubArgs,
    },

    /// Print the tool declarations offered to the model
    Tools,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Assess {
                username,
                personality,
                intensity,
                github,
                llm,
            } => {
                info!("Assessing GitHub user: {username}");

                let assessor = Assessor::new(Arc::new(github.client()?), Arc::new(llm.model()?));
                let request =
                    AssessmentRequest::new(username, *personality, Intensity::try_from(*intensity)?)?;

                let (tx, mut rx) = mpsc::channel::<String>(CHUNK_BUFFER);
                let printer = tokio::spawn(async move {
                    let mut stdout = std::io::stdout();
                    while let Some(chunk) = rx.recv().await {
                        write!(stdout, "{chunk}")?;
                        stdout.flush()?;
                    }
                    writeln!(stdout)
                });

                let outcome = assessor.assess(&request, &tx).await;
                drop(tx);
                printer.await??;
                let text = outcome?;

                if let Some(output_path) = &self.output {
                    std::fs::write(output_path, text)?;
                    info!("Assessment written to: {}", output_path.display());
                }

                Ok(())
            }
            Commands::Serve { bind, github, llm } => {
                let assessor = Assessor::new(Arc::new(github.client()?), Arc::new(llm.model()?));
                server::serve(bind, AppState::new(assessor)).await?;
                Ok(())
            }
            Commands::Fetch {
                tool,
                username,
                github,
            } => {
                info!("Running {} for {username}", tool.tool_name());

                let output = tool.run(&github.client()?, username).await?;
                self.write_json(&output)
            }
            Commands::Tools => {
                let declarations: Vec<_> = GitHubToolKind::ALL
                    .into_iter()
                    .map(GitHubToolKind::declaration)
                    .collect();
                self.write_json(&declarations)
            }
        }
    }

    fn write_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_assess_defaults() {
        let cli = Cli::try_parse_from([
            "ghassess",
            "assess",
            "octocat",
            "--token",
            "ghp_test",
            "--api-key",
            "key",
        ])
        .unwrap();

        match cli.command {
            Commands::Assess {
                username,
                personality,
                intensity,
                ..
            } => {
                assert_eq!(username, "octocat");
                assert_eq!(personality, Persona::PublicHealthRecruiter);
                assert_eq!(intensity, 3);
            }
            _ => panic!("expected assess command"),
        }
    }

    #[test]
    fn test_assess_rejects_out_of_range_intensity() {
        let result = Cli::try_parse_from([
            "ghassess", "assess", "octocat", "-i", "6", "--token", "t", "--api-key", "k",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_parses_tool_name() {
        let cli = Cli::try_parse_from([
            "ghassess",
            "fetch",
            "language-stats",
            "octocat",
            "--token",
            "t",
            "--pretty",
        ])
        .unwrap();

        assert!(cli.pretty);
        match cli.command {
            Commands::Fetch { tool, .. } => assert_eq!(tool, GitHubToolKind::LanguageStats),
            _ => panic!("expected fetch command"),
        }
    }
}

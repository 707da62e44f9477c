use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::GitHubClient;
use crate::error::{GhAssessError, Result};
use crate::tools::{Tool, ToolDeclaration, ToolSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GitHubToolKind {
    Profile,
    Repositories,
    LanguageStats,
    Starred,
    CommitMessages,
}

#[derive(Debug, Deserialize)]
struct UsernameInput {
    username: String,
}

impl GitHubToolKind {
    pub const ALL: [Self; 5] = [
        Self::Profile,
        Self::Repositories,
        Self::LanguageStats,
        Self::Starred,
        Self::CommitMessages,
    ];

    pub fn tool_name(self) -> &'static str {
        match self {
            Self::Profile => "fetchUserProfile",
            Self::Repositories => "fetchRepositories",
            Self::LanguageStats => "fetchLanguageStats",
            Self::Starred => "fetchStarredRepositories",
            Self::CommitMessages => "fetchCommitMessages",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Profile => {
                "Fetch a GitHub user's public profile: name, bio, company, location, \
                 follower counts, public repository count and account age."
            }
            Self::Repositories => {
                "Fetch the user's 15 most recently pushed repositories with primary \
                 language, last push time, stars and forks."
            }
            Self::LanguageStats => {
                "Count the primary languages across up to 100 of the user's repositories \
                 and rank the top 5 with their share of all counted repositories."
            }
            Self::Starred => {
                "Summarize the user's 20 most recently starred repositories: how many, \
                 the top 5 languages among them and the 10 most recent stars."
            }
            Self::CommitMessages => {
                "List commit messages from push events among the user's 100 most recent \
                 public events."
            }
        }
    }

    fn output_schema(self) -> Value {
        let nullable_string = json!({"type": ["string", "null"]});
        match self {
            Self::Profile => json!({
                "type": "object",
                "properties": {
                    "login": {"type": "string"},
                    "id": {"type": "integer"},
                    "avatar_url": {"type": "string"},
                    "html_url": {"type": "string"},
                    "name": nullable_string,
                    "company": nullable_string,
                    "blog": nullable_string,
                    "location": nullable_string,
                    "bio": nullable_string,
                    "public_repos": {"type": "integer"},
                    "followers": {"type": "integer"},
                    "following": {"type": "integer"},
                    "created_at": {"type": "string", "format": "date-time"},
                    "updated_at": {"type": "string", "format": "date-time"}
                }
            }),
            Self::Repositories => json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "language": nullable_string,
                        "pushedAt": {"type": ["string", "null"], "format": "date-time"},
                        "stars": {"type": "integer"},
                        "forks": {"type": "integer"}
                    }
                }
            }),
            Self::LanguageStats => json!({
                "type": "object",
                "properties": {
                    "languages": {"type": "object", "additionalProperties": {"type": "integer"}},
                    "totalRepos": {"type": "integer"},
                    "topLanguages": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": {"type": "string"},
                                "count": {"type": "integer"},
                                "percentage": {"type": "integer"}
                            }
                        }
                    }
                }
            }),
            Self::Starred => json!({
                "type": "object",
                "properties": {
                    "totalStarred": {"type": "integer"},
                    "topLanguages": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": {"type": "string"},
                                "count": {"type": "integer"}
                            }
                        }
                    },
                    "recent": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": {"type": "string"},
                                "language": nullable_string,
                                "description": nullable_string,
                                "stars": {"type": "integer"}
                            }
                        }
                    }
                }
            }),
            Self::CommitMessages => json!({
                "type": "object",
                "properties": {
                    "messages": {"type": "array", "items": {"type": "string"}}
                }
            }),
        }
    }

    pub fn declaration(self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.tool_name(),
            description: self.description(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "username": {
                        "type": "string",
                        "description": "GitHub login of the user to look up"
                    }
                },
                "required": ["username"]
            }),
            output_schema: self.output_schema(),
        }
    }

    /// Runs the fetcher and returns its result as JSON.
    pub async fn run(self, client: &GitHubClient, username: &str) -> Result<Value> {
        let output = match self {
            Self::Profile => serde_json::to_value(client.fetch_user_profile(username).await?)?,
            Self::Repositories => {
                serde_json::to_value(client.fetch_repositories(username).await?)?
            }
            Self::LanguageStats => {
                serde_json::to_value(client.fetch_language_stats(username).await?)?
            }
            Self::Starred => {
                serde_json::to_value(client.fetch_starred_repositories(username).await?)?
            }
            Self::CommitMessages => {
                serde_json::to_value(client.fetch_commit_messages(username).await?)?
            }
        };
        Ok(output)
    }
}

pub struct GitHubTool {
    kind: GitHubToolKind,
    client: Arc<GitHubClient>,
}

#[async_trait]
impl Tool for GitHubTool {
    fn name(&self) -> &'static str {
        self.kind.tool_name()
    }

    fn declaration(&self) -> ToolDeclaration {
        self.kind.declaration()
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let input: UsernameInput = serde_json::from_value(input).map_err(|e| {
            GhAssessError::InvalidArgument(format!("{}: {e}", self.kind.tool_name()))
        })?;

        self.kind.run(&self.client, &input.username).await
    }
}

/// Every fetcher, exposed as a tool backed by the shared client.
pub fn github_tools(client: Arc<GitHubClient>) -> ToolSet {
    GitHubToolKind::ALL
        .into_iter()
        .fold(ToolSet::new(), |tools, kind| {
            tools.with(GitHubTool {
                kind,
                client: Arc::clone(&client),
            })
        })
}

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RepositoryDto {
    pub name: String,
    pub language: Option<String>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub stargazers_count: u32,
    pub forks_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StarredRepositoryDto {
    pub full_name: String,
    pub language: Option<String>,
    pub description: Option<String>,
    pub stargazers_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct EventDto {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: EventPayloadDto,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventPayloadDto {
    #[serde(default)]
    pub commits: Option<Vec<CommitDto>>,
}

#[derive(Debug, Deserialize)]
pub struct CommitDto {
    pub message: String,
}

const PUSH_EVENT: &str = "PushEvent";

impl EventDto {
    pub fn is_push_with_commits(&self) -> bool {
        self.kind == PUSH_EVENT
            && self
                .payload
                .commits
                .as_ref()
                .is_some_and(|commits| !commits.is_empty())
    }
}

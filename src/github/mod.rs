mod client;
mod dto;
mod fetchers;
mod languages;
mod tools;

pub use client::{GitHubClient, ProbeOutcome, DEFAULT_API_URL};
pub use tools::{github_tools, GitHubToolKind};

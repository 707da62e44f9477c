use log::info;

use super::client::GitHubClient;
use super::dto::{EventDto, RepositoryDto, StarredRepositoryDto};
use super::languages::{language_statistics, top_language_counts};
use crate::error::Result;
use crate::models::{
    CommitMessageList, LanguageStatistics, RepositorySummary, StarredRepositoriesSummary,
    StarredRepository, UserProfile,
};

const RECENT_STARRED: usize = 10;

impl GitHubClient {
    pub async fn fetch_user_profile(&self, username: &str) -> Result<UserProfile> {
        info!("Fetching GitHub profile for {username}");
        self.get_user_resource(username, "", &[]).await
    }

    /// The 15 most recently pushed repositories.
    pub async fn fetch_repositories(&self, username: &str) -> Result<Vec<RepositorySummary>> {
        info!("Fetching recent repositories for {username}");

        let repos: Vec<RepositoryDto> = self
            .get_user_resource(username, "/repos", &[("sort", "pushed"), ("per_page", "15")])
            .await?;

        Ok(repos
            .into_iter()
            .map(|repo| RepositorySummary {
                name: repo.name,
                language: repo.language,
                pushed_at: repo.pushed_at,
                stars: repo.stargazers_count,
                forks: repo.forks_count,
            })
            .collect())
    }

    pub async fn fetch_language_stats(&self, username: &str) -> Result<LanguageStatistics> {
        info!("Fetching language statistics for {username}");

        let repos: Vec<RepositoryDto> = self
            .get_user_resource(username, "/repos", &[("per_page", "100"), ("type", "all")])
            .await?;

        Ok(language_statistics(
            repos.iter().map(|repo| repo.language.as_deref()),
        ))
    }

    pub async fn fetch_starred_repositories(
        &self,
        username: &str,
    ) -> Result<StarredRepositoriesSummary> {
        info!("Fetching starred repositories for {username}");

        let starred: Vec<StarredRepositoryDto> = self
            .get_user_resource(
                username,
                "/starred",
                &[("per_page", "20"), ("sort", "created")],
            )
            .await?;

        let top_languages =
            top_language_counts(starred.iter().map(|repo| repo.language.as_deref()));
        let total_starred = starred.len();
        let recent = starred
            .into_iter()
            .take(RECENT_STARRED)
            .map(|repo| StarredRepository {
                name: repo.full_name,
                language: repo.language,
                description: repo.description,
                stars: repo.stargazers_count,
            })
            .collect();

        Ok(StarredRepositoriesSummary {
            total_starred,
            top_languages,
            recent,
        })
    }

    /// Commit messages from push events among the 100 most recent public events.
    pub async fn fetch_commit_messages(&self, username: &str) -> Result<CommitMessageList> {
        info!("Fetching recent commit messages for {username}");

        let events: Vec<EventDto> = self
            .get_user_resource(username, "/events", &[("per_page", "100")])
            .await?;

        let messages = events
            .into_iter()
            .filter(EventDto::is_push_with_commits)
            .flat_map(|event| event.payload.commits.unwrap_or_default())
            .map(|commit| commit.message)
            .collect();

        Ok(CommitMessageList { messages })
    }
}

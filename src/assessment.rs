use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{GhAssessError, Result};
use crate::github::{github_tools, GitHubClient, ProbeOutcome};
use crate::llm::{GenerateRequest, LanguageModel};
use crate::prompt::{assessment_prompt, not_found_prompt, Intensity, Persona};
use crate::tools::ToolSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub username: String,
    #[serde(default)]
    pub personality: Persona,
    #[serde(default)]
    pub intensity: Intensity,
}

impl AssessmentRequest {
    pub fn new(username: &str, personality: Persona, intensity: Intensity) -> Result<Self> {
        let request = Self {
            username: username.to_string(),
            personality,
            intensity,
        };
        request.validate()?;
        Ok(request)
    }

    /// Parses caller-supplied JSON, filling in defaults and rejecting bad input.
    pub fn from_value(value: Value) -> Result<Self> {
        let request: Self = serde_json::from_value(value)
            .map_err(|e| GhAssessError::InvalidArgument(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(GhAssessError::InvalidArgument(
                "username must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Drives one assessment: probe the account, then let the model write.
pub struct Assessor {
    github: Arc<GitHubClient>,
    model: Arc<dyn LanguageModel>,
    tools: ToolSet,
}

impl Assessor {
    pub fn new(github: Arc<GitHubClient>, model: Arc<dyn LanguageModel>) -> Self {
        let tools = github_tools(Arc::clone(&github));
        Self {
            github,
            model,
            tools,
        }
    }

    pub async fn assess(
        &self,
        request: &AssessmentRequest,
        chunks: &mpsc::Sender<String>,
    ) -> Result<String> {
        let username = request.username.trim();

        match self.github.probe_user(username).await {
            ProbeOutcome::NotFound => {
                info!("GitHub user {username} not found, narrating that instead");
                return self.narrate_not_found(username, request.personality, chunks).await;
            }
            ProbeOutcome::Found => {}
            ProbeOutcome::Inconclusive(reason) => {
                warn!("Could not confirm GitHub user {username} exists ({reason}), assessing anyway");
            }
        }

        info!(
            "Assessing {username} as {} at intensity {} with {}",
            request.personality,
            request.intensity.level(),
            self.model.model_name()
        );

        let prompt = assessment_prompt(username, request.personality, request.intensity);
        let generation = GenerateRequest {
            prompt: &prompt,
            tools: Some(&self.tools),
            temperature: request.intensity.temperature(),
        };
        self.model.generate(generation, chunks).await
    }

    async fn narrate_not_found(
        &self,
        username: &str,
        persona: Persona,
        chunks: &mpsc::Sender<String>,
    ) -> Result<String> {
        let prompt = not_found_prompt(username, persona);
        let generation = GenerateRequest {
            prompt: &prompt,
            tools: None,
            temperature: Intensity::default().temperature(),
        };

        let text = self.model.generate(generation, chunks).await?;
        if !text.is_empty() {
            return Ok(text);
        }

        let fallback = format!("The GitHub user \"{username}\" could not be found.");
        let _ = chunks.send(fallback.clone()).await;
        Ok(fallback)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::Token;
    use crate::llm::testing::ScriptedModel;

    fn assessor(server: &mockito::Server, model: Arc<ScriptedModel>) -> Assessor {
        let github = GitHubClient::new(&server.url(), Token::from("test-token")).unwrap();
        Assessor::new(Arc::new(github), model)
    }

    async fn collect(assessor: &Assessor, request: &AssessmentRequest) -> (Result<String>, String) {
        let (tx, mut rx) = mpsc::channel(64);
        let result = assessor.assess(request, &tx).await;
        drop(tx);

        let mut streamed = String::new();
        while let Some(chunk) = rx.recv().await {
            streamed.push_str(&chunk);
        }
        (result, streamed)
    }

    #[test]
    fn test_request_defaults_are_filled_in() {
        let request = AssessmentRequest::from_value(json!({"username": "octocat"})).unwrap();

        assert_eq!(request.username, "octocat");
        assert_eq!(request.personality, Persona::PublicHealthRecruiter);
        assert_eq!(request.intensity.level(), 3);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "username": "octocat",
                "personality": "public-health-recruiter",
                "intensity": 3
            })
        );
    }

    #[test]
    fn test_request_rejects_out_of_range_intensity() {
        for intensity in [0, 6, -1, 300] {
            let err = AssessmentRequest::from_value(json!({
                "username": "octocat",
                "intensity": intensity
            }))
            .unwrap_err();

            assert!(matches!(err, GhAssessError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_request_rejects_unknown_persona() {
        let err = AssessmentRequest::from_value(json!({
            "username": "octocat",
            "personality": "pirate-captain"
        }))
        .unwrap_err();

        assert!(matches!(err, GhAssessError::InvalidArgument(_)));
    }

    #[test]
    fn test_request_rejects_missing_or_blank_username() {
        assert!(AssessmentRequest::from_value(json!({"intensity": 2})).is_err());
        assert!(AssessmentRequest::from_value(json!({"username": "  "})).is_err());
        assert!(AssessmentRequest::new("", Persona::default(), Intensity::default()).is_err());
    }

    #[tokio::test]
    async fn test_not_found_user_skips_tools() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/users/no-such-user")
            .with_status(404)
            .create_async()
            .await;
        let model = Arc::new(ScriptedModel::replying(&["Nobody ", "home."]));
        let assessor = assessor(&server, Arc::clone(&model));
        let request =
            AssessmentRequest::new("no-such-user", Persona::default(), Intensity::default())
                .unwrap();

        let (result, streamed) = collect(&assessor, &request).await;

        let text = result.unwrap();
        assert_eq!(text, "Nobody home.");
        assert_eq!(streamed, text);
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].tool_names.is_empty());
        assert!(calls[0].prompt.contains("no such account exists"));
    }

    #[tokio::test]
    async fn test_not_found_user_gets_fallback_when_model_is_silent() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/users/ghost")
            .with_status(404)
            .create_async()
            .await;
        let model = Arc::new(ScriptedModel::replying(&[]));
        let assessor = assessor(&server, model);
        let request =
            AssessmentRequest::new("ghost", Persona::default(), Intensity::default()).unwrap();

        let (result, streamed) = collect(&assessor, &request).await;

        let text = result.unwrap();
        assert!(!text.is_empty());
        assert_eq!(streamed, text);
    }

    #[tokio::test]
    async fn test_existing_user_gets_tools_and_intensity_temperature() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/users/octocat")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let model = Arc::new(ScriptedModel::replying(&["A ", "fine ", "developer."]));
        let assessor = assessor(&server, Arc::clone(&model));
        let request = AssessmentRequest::new(
            "octocat",
            Persona::SiliconValleyVc,
            Intensity::try_from(5).unwrap(),
        )
        .unwrap();

        let (result, streamed) = collect(&assessor, &request).await;

        assert_eq!(result.unwrap(), "A fine developer.");
        assert_eq!(streamed, "A fine developer.");
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 1.2);
        assert_eq!(calls[0].tool_names.len(), 5);
        assert!(calls[0].prompt.contains("venture capitalist"));
    }

    #[tokio::test]
    async fn test_inconclusive_probe_still_assesses() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/users/octocat")
            .with_status(502)
            .create_async()
            .await;
        let model = Arc::new(ScriptedModel::replying(&["ok"]));
        let assessor = assessor(&server, Arc::clone(&model));
        let request =
            AssessmentRequest::new("octocat", Persona::default(), Intensity::default()).unwrap();

        let (result, _) = collect(&assessor, &request).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(model.calls()[0].tool_names.len(), 5);
    }

    #[tokio::test]
    async fn test_tool_failure_fails_the_assessment() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/users/octocat")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let _starred = server
            .mock("GET", "/users/octocat/starred")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let model = Arc::new(
            ScriptedModel::replying(&["never sent"])
                .calling_tool("fetchStarredRepositories", json!({"username": "octocat"})),
        );
        let assessor = assessor(&server, model);
        let request =
            AssessmentRequest::new("octocat", Persona::default(), Intensity::default()).unwrap();

        let (result, streamed) = collect(&assessor, &request).await;

        assert!(matches!(result, Err(GhAssessError::Upstream { .. })));
        assert!(streamed.is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server
            .mock("GET", "/users/octocat")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let model = Arc::new(ScriptedModel::failing("model unavailable"));
        let assessor = assessor(&server, model);
        let request =
            AssessmentRequest::new("octocat", Persona::default(), Intensity::default()).unwrap();

        let (result, _) = collect(&assessor, &request).await;

        assert!(matches!(result, Err(GhAssessError::Generation(m)) if m == "model unavailable"));
    }
}

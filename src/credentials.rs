//! OpenAI credential handling.
//!
//! A credential is an API key plus an optional project id. Keys with the
//! `sk-proj-` prefix are project-scoped and need a non-empty project id
//! before any remote call will be accepted by the API. The check here is
//! a pure string-pattern test with no network validation; callers decide
//! whether to block the action.

/// Prefix the API uses for project-scoped keys.
const PROJECT_KEY_PREFIX: &str = "sk-proj-";

/// An API key plus an optional project qualifier.
#[derive(Debug, Clone)]
pub struct Credential {
    pub api_key: String,
    pub project_id: Option<String>,
}

impl Credential {
    pub fn new(api_key: impl Into<String>, project_id: Option<String>) -> Self {
        let project_id = project_id.filter(|p| !p.trim().is_empty());
        Self {
            api_key: api_key.into(),
            project_id,
        }
    }

    /// Read `OPENAI_API_KEY` / `OPENAI_PROJECT_ID` from the environment.
    /// Missing variables become empty key / absent project id; validation
    /// is the caller's concern.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            std::env::var("OPENAI_PROJECT_ID").ok(),
        )
    }

    /// True when the key matches the project-scoped prefix pattern.
    pub fn requires_project_id(&self) -> bool {
        self.api_key.starts_with(PROJECT_KEY_PREFIX)
    }

    /// Advisory precondition check. `Err` carries a human-readable
    /// reason; this layer never rejects remote calls itself.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.api_key.trim().is_empty() {
            return Err("no API key set (export OPENAI_API_KEY)");
        }
        if self.requires_project_id() && self.project_id.is_none() {
            return Err(
                "project-scoped key (sk-proj-...) requires a project id (export OPENAI_PROJECT_ID)",
            );
        }
        Ok(())
    }
}

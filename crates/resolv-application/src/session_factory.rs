//! Lazily creates dialogue sessions for the turn controller.

use async_trait::async_trait;
use resolv_core::{ResolvError, Result};
use resolv_interaction::config::ResolvSettings;
use resolv_interaction::{DialogueOptions, DialogueSession, GeminiApiAgent, ModelService};
use std::sync::Arc;

/// Builds a ready-to-use `DialogueSession`.
///
/// Failures must be `ResolvError::Initialization`.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create_session(&self) -> Result<DialogueSession>;
}

/// Creates sessions against the Gemini API from resolved settings.
pub struct GeminiSessionFactory {
    settings: ResolvSettings,
}

impl GeminiSessionFactory {
    pub fn new(settings: ResolvSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionFactory for GeminiSessionFactory {
    async fn create_session(&self) -> Result<DialogueSession> {
        let agent = GeminiApiAgent::try_from_settings(&self.settings)?;
        let options = DialogueOptions::default().with_max_rounds(self.settings.dialogue.max_rounds);
        DialogueSession::create(Arc::new(agent), options).await
    }
}

/// Creates sessions against an already-built model service.
pub struct ServiceSessionFactory {
    service: Arc<dyn ModelService>,
    options: DialogueOptions,
}

impl ServiceSessionFactory {
    pub fn new(service: Arc<dyn ModelService>, options: DialogueOptions) -> Self {
        Self { service, options }
    }
}

#[async_trait]
impl SessionFactory for ServiceSessionFactory {
    async fn create_session(&self) -> Result<DialogueSession> {
        DialogueSession::create(self.service.clone(), self.options.clone())
            .await
            .map_err(ResolvError::into_initialization)
    }
}

//! Shared fixtures for handler and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, CounterBackend};
use crate::llm_client::{Completion, CompletionService, FinishReason, LlmError};
use crate::rate_limit::{MemoryCounterStore, RateLimiter};
use crate::state::AppState;

enum Behavior {
    Reply(Completion),
    Fail,
    Hang(Duration),
}

/// Canned completion service that records how it was called.
pub struct StubCompletion {
    behavior: Behavior,
    pub calls: AtomicUsize,
    pub last_prompt: Mutex<Option<String>>,
}

impl StubCompletion {
    fn with(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn reply(text: &str, finish_reason: FinishReason) -> Arc<Self> {
        Self::with(Behavior::Reply(Completion::from_text(text, finish_reason)))
    }

    pub fn empty() -> Arc<Self> {
        Self::with(Behavior::Reply(Completion::default()))
    }

    pub fn failing() -> Arc<Self> {
        Self::with(Behavior::Fail)
    }

    pub fn hanging(delay: Duration) -> Arc<Self> {
        Self::with(Behavior::Hang(delay))
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        match &self.behavior {
            Behavior::Reply(completion) => Ok(completion.clone()),
            Behavior::Fail => Err(LlmError::Api {
                status: 429,
                message: "Resource has been exhausted (e.g. check quota).".to_string(),
            }),
            Behavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Completion::default())
            }
        }
    }
}

pub fn test_config() -> Config {
    Config {
        gemini_api_key: "test-key".to_string(),
        gemini_model: "gemini-2.5-flash".to_string(),
        redis_url: "redis://localhost:6379/0".to_string(),
        counter_backend: CounterBackend::Memory,
        rate_limit_max: 3,
        rate_limit_window: Duration::from_secs(24 * 60 * 60),
        upstream_timeout: Duration::from_secs(30),
        port: 8080,
        environment: "test".to_string(),
        static_dir: "./static".to_string(),
        rust_log: "debug".to_string(),
    }
}

/// App state with an in-memory counter store and the given completion stub.
pub fn test_state(llm: Arc<StubCompletion>) -> AppState {
    let config = test_config();
    AppState {
        limiter: RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            config.rate_limit_max,
            config.rate_limit_window,
        ),
        llm,
        config,
    }
}

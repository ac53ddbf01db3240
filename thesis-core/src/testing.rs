//! Test doubles shared by the unit tests.

use crate::provider::{GenerateRequest, Provider, ProviderError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Provider whose answers are fixed up front.
///
/// Generation pops queued responses first and then falls back to the
/// responder closure. Embeddings are looked up by exact input text.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    responder: Option<Responder>,
    embeddings: HashMap<String, Vec<f32>>,
    default_embedding: Option<Vec<f32>>,
    fail_embeddings: bool,
    prompts: Arc<Mutex<Vec<String>>>,
    embed_calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut queue) = self.responses.lock() {
            queue.extend(responses.into_iter().map(|r| Ok(r.into())));
        }
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Err(message.to_string()));
        }
        self
    }

    pub fn with_responder(mut self, responder: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn with_embedding(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.embeddings.insert(text.to_string(), vector);
        self
    }

    pub fn with_default_embedding(mut self, vector: Vec<f32>) -> Self {
        self.default_embedding = Some(vector);
        self
    }

    pub fn failing_embeddings(mut self) -> Self {
        self.fail_embeddings = true;
        self
    }

    /// Prompts seen by `generate`, in call order.
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }

    pub fn embed_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.embed_calls)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next.map_err(ProviderError::Api);
        }

        match &self.responder {
            Some(responder) => Ok(responder(&request.prompt)),
            None => Err(ProviderError::Other("no scripted response left".into())),
        }
    }

    async fn embed(&self, inputs: &[String], _model: &str) -> Result<Vec<Vec<f32>>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embeddings {
            return Err(ProviderError::Api("embedding model not loaded".into()));
        }

        inputs
            .iter()
            .map(|input| {
                self.embeddings
                    .get(input)
                    .or(self.default_embedding.as_ref())
                    .cloned()
                    .ok_or_else(|| ProviderError::Other(format!("no embedding for {:?}", input)))
            })
            .collect()
    }
}

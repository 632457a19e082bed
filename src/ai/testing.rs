use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::client::{GenerativeModel, InlineImage};
use super::error::AiError;

/// Replays canned answers in order and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedModel {
    answers: Mutex<VecDeque<Result<Value, AiError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(answers: impl IntoIterator<Item = Value>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(Ok).collect()),
            prompts: Mutex::default(),
        }
    }

    pub fn failing(err: AiError) -> Self {
        Self {
            answers: Mutex::new(VecDeque::from([Err(err)])),
            prompts: Mutex::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate_json(&self, prompt: &str, _image: Option<InlineImage>) -> Result<Value, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Malformed("no scripted answer left".into())))
    }
}

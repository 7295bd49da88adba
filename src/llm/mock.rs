//! Mock LLM 客户端（用于测试，无需 API）
//!
//! with_responses 按脚本顺序返回预设回复，耗尽后回退为固定 Final Answer；
//! repeating 每次返回同一条文本，便于测试步数预算耗尽路径。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};

/// Mock 客户端：按脚本或重复文本回复
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
    /// 脚本耗尽后（或 repeating 模式下）返回的文本
    fallback: String,
}

impl MockLlmClient {
    /// 按给定顺序返回脚本回复，耗尽后返回固定 Final Answer
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            fallback: "Final Answer: (no scripted response left)".to_string(),
        }
    }

    /// 每次调用都返回同一条文本
    pub fn repeating(text: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: text.into(),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, _prompt: &str, _stop: &[String]) -> Result<String, LlmError> {
        let mut queue = self.responses.lock().unwrap();
        Ok(queue.pop_front().unwrap_or_else(|| self.fallback.clone()))
    }
}

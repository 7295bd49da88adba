//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient::generate：传入拼好的 prompt 与 stop 序列，
//! 返回补全文本。失败对整次运行致命，编排层不在内部重试。

use async_trait::async_trait;
use thiserror::Error;

/// LLM 调用失败：认证 / 配额 / 传输
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited or quota exceeded: {0}")]
    RateLimited(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// LLM 客户端 trait：单次文本补全，生成内容在 stop 序列处截断
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str, stop: &[String]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

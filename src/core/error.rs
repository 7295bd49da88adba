//! Agent 错误类型
//!
//! ParseError 与 LLM 失败对整次运行致命；ToolError 由编排层转为 Observation 文本继续下一轮；
//! ChainConfigError 在链上任何工具执行之前抛出。

use thiserror::Error;

use crate::llm::LlmError;

/// 工具失败类别（校验 / 超时 / 执行）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    Validation,
    Timeout,
    Execution,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolErrorKind::Validation => write!(f, "validation"),
            ToolErrorKind::Timeout => write!(f, "timeout"),
            ToolErrorKind::Execution => write!(f, "execution"),
        }
    }
}

/// 单次工具调用失败：携带工具名、类别与最后一次观察到的错误信息
#[derive(Debug, Clone, Error)]
#[error("Tool '{tool}' failed ({kind}): {message}")]
pub struct ToolError {
    pub tool: String,
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn validation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            kind: ToolErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn timeout(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            kind: ToolErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            kind: ToolErrorKind::Execution,
            message: message.into(),
        }
    }
}

/// Agent 运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM 输出无法解析为动作，对整次运行致命
    #[error("Unparsable LLM output: {0}")]
    ParseError(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// 单个工具调用失败；编排层转为 Observation 继续
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// 链名或链内工具名未定义，在任何工具执行前抛出
    #[error("Chain config error: {0}")]
    ChainConfigError(String),
}

impl AgentError {
    /// 是否为单个工具调用的局部失败（可转为 Observation 继续运行）
    pub fn is_tool_error(&self) -> bool {
        matches!(self, AgentError::Tool(_))
    }
}

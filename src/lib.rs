//! Wasp - Rust Agent 编排循环
//!
//! 模块划分：
//! - **agent**: 无头装配（从配置构建 Orchestrator）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、目标追踪与编排主循环
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）、嵌入提供方
//! - **memory**: 有界短期 / 长期记忆与相关性检索
//! - **react**: 动作解析与 Planner
//! - **tools**: 工具 trait、执行器（缓存 / 重试 / 超时 / 统计）与工具链

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod tools;

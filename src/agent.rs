//! 无头 Agent 装配
//!
//! 从 AppConfig 构建 LlmClient、工具注册表与 Orchestrator，供宿主程序直接调用 run；
//! provider=mock 时完全离线，适合本地跑通循环。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::{FallbackAction, Orchestrator};
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient, OpenAiEmbedder};
use crate::memory::MemoryStore;
use crate::react::Planner;
use crate::tools::{
    BackoffPolicy, EchoTool, ExecutorConfig, HackerNewsTool, ToolChainRunner, ToolRegistry,
};

/// 按配置创建 LLM 客户端：provider=mock 时用 MockLlmClient（无需 API Key）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    match cfg.llm.provider.as_str() {
        "mock" => Arc::new(MockLlmClient::repeating("Final Answer: (mock)")),
        _ => Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            None,
        )),
    }
}

/// 默认工具注册表：echo 与 hackernews
pub fn default_registry(cfg: &AppConfig) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(EchoTool);
    tools.register(HackerNewsTool::new(
        cfg.tools.hackernews.timeout_secs,
        cfg.tools.hackernews.max_result_chars,
    ));
    tools
}

/// 从配置构建 Orchestrator：LLM、执行器配置、记忆容量与回退动作一次装配到位
pub fn create_orchestrator(cfg: &AppConfig) -> Orchestrator {
    let llm = create_llm_from_config(cfg);
    let registry = default_registry(cfg);
    let executor_config = ExecutorConfig {
        timeout: Duration::from_secs(cfg.tools.timeout_secs),
        backoff: BackoffPolicy::new(
            cfg.tools.max_retries,
            Duration::from_millis(cfg.tools.backoff_ms),
        ),
        cache_enabled: cfg.tools.cache_enabled,
    };
    let runner = ToolChainRunner::new(&registry, &executor_config);

    let mut memory = MemoryStore::new(cfg.memory.max_short_term, cfg.memory.max_long_term);
    if let Some(ref model) = cfg.llm.embedding_model {
        memory = memory.with_embedder(Arc::new(OpenAiEmbedder::new(
            cfg.llm.base_url.as_deref(),
            model,
            None,
        )));
    }

    let mut orchestrator = Orchestrator::new(Planner::new(llm), runner, memory)
        .with_max_loops(cfg.agent.max_loops)
        .with_confidence_threshold(cfg.agent.confidence_threshold)
        .with_top_k(cfg.memory.top_k);
    if let Some(ref name) = cfg.agent.fallback_tool {
        orchestrator = orchestrator.with_fallback(FallbackAction::Tool(name.clone()));
    }
    orchestrator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_mock_provider_runs_offline() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        let mut orchestrator = create_orchestrator(&cfg);
        let answer = orchestrator.run("anything").await.unwrap();
        assert_eq!(answer, "(mock)");
    }
}

//! 工具链
//!
//! 具名的有序工具序列：前一工具的输出作为后一工具的输入；任一工具失败立即中止
//! （后续工具不再执行），错误携带失败工具名向上传播；链名或链内工具名未定义时
//! 在执行任何工具之前报 ChainConfigError。每个工具的统计与单独调用时一致。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{AgentError, ToolError};
use crate::tools::{BackoffPolicy, Tool, ToolExecutor, ToolRegistry, ToolStats};

/// 执行器公共配置：注册工具时逐一应用
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    pub timeout: Duration,
    pub backoff: BackoffPolicy,
    pub cache_enabled: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            cache_enabled: true,
        }
    }
}

/// 工具链执行器：持有全部 ToolExecutor（独占各自的缓存与统计）与具名链定义
pub struct ToolChainRunner {
    executors: HashMap<String, ToolExecutor>,
    chains: HashMap<String, Vec<String>>,
    /// (name, description)，按名排序，供 prompt 的 Available tools 段落
    descriptions: Vec<(String, String)>,
}

impl ToolChainRunner {
    /// 从注册表构建：每个工具一个 ToolExecutor
    pub fn new(registry: &ToolRegistry, config: &ExecutorConfig) -> Self {
        let mut runner = Self {
            executors: HashMap::new(),
            chains: HashMap::new(),
            descriptions: Vec::new(),
        };
        for (_, tool) in registry.iter() {
            runner.register(tool.clone(), config);
        }
        runner
    }

    /// 补充注册单个工具
    pub fn register(&mut self, tool: Arc<dyn Tool>, config: &ExecutorConfig) {
        let name = tool.name().to_string();
        self.descriptions
            .retain(|(existing, _)| existing != &name);
        self.descriptions
            .push((name.clone(), tool.description().to_string()));
        self.descriptions.sort_by(|a, b| a.0.cmp(&b.0));
        let executor = ToolExecutor::new(tool, config.timeout, config.backoff.clone())
            .with_cache(config.cache_enabled);
        self.executors.insert(name, executor);
    }

    /// 定义具名链；工具名在执行时（而非定义时）统一校验
    pub fn define_chain(&mut self, name: impl Into<String>, tool_names: Vec<String>) {
        self.chains.insert(name.into(), tool_names);
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    pub fn has_chain(&self, name: &str) -> bool {
        self.chains.contains_key(name)
    }

    pub fn tool_descriptions(&self) -> &[(String, String)] {
        &self.descriptions
    }

    pub fn stats(&self, tool_name: &str) -> Option<&ToolStats> {
        self.executors.get(tool_name).map(|e| e.stats())
    }

    /// 全部工具的统计快照
    pub fn all_stats(&self) -> impl Iterator<Item = (&str, &ToolStats)> {
        self.executors.iter().map(|(name, e)| (name.as_str(), e.stats()))
    }

    /// 按调用次数降序返回最常用的前 limit 个工具
    pub fn most_used_tools(&self, limit: usize) -> Vec<(String, ToolStats)> {
        let mut sorted: Vec<(String, ToolStats)> = self
            .executors
            .iter()
            .map(|(name, e)| (name.clone(), e.stats().clone()))
            .collect();
        sorted.sort_by(|a, b| b.1.usage_count.cmp(&a.1.usage_count));
        sorted.truncate(limit);
        sorted
    }

    pub fn executor_mut(&mut self, name: &str) -> Option<&mut ToolExecutor> {
        self.executors.get_mut(name)
    }

    /// 编排层 ToolCall 的分发入口：名字命中链定义时执行整条链，否则执行单个工具。
    /// 未知工具名作为校验类 ToolError 返回，由编排层转为 Observation。
    pub async fn call_tool(&mut self, name: &str, input: &str) -> Result<String, AgentError> {
        if self.chains.contains_key(name) {
            return self.execute_chain(name, input).await;
        }
        let executor = self.executors.get_mut(name).ok_or_else(|| {
            AgentError::Tool(ToolError::validation(name, "unknown tool"))
        })?;
        Ok(executor.call(input).await?)
    }

    /// 执行具名链：先校验链与链内所有工具名（任何工具执行前），再按序管道
    pub async fn execute_chain(
        &mut self,
        name: &str,
        initial_input: &str,
    ) -> Result<String, AgentError> {
        let chain = self
            .chains
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::ChainConfigError(format!("Undefined chain: {name}")))?;

        if let Some(missing) = chain.iter().find(|t| !self.executors.contains_key(*t)) {
            return Err(AgentError::ChainConfigError(format!(
                "Chain '{name}' references unknown tool: {missing}"
            )));
        }

        let mut current = initial_input.to_string();
        for tool_name in &chain {
            let Some(executor) = self.executors.get_mut(tool_name) else {
                return Err(AgentError::ChainConfigError(format!(
                    "Chain '{name}' references unknown tool: {tool_name}"
                )));
            };
            // 首个失败即中止，后续工具不再执行；ToolError 自带工具名
            current = executor.call(&current).await?;
        }
        Ok(current)
    }
}

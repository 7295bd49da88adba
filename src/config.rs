//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WASP__*` 覆盖（双下划线表示嵌套，
//! 如 `WASP__AGENT__MAX_LOOPS=10`）。所有旋钮都是普通标量，运行中不支持动态改配。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub memory: MemorySection,
}

/// [agent] 段：循环预算、置信度阈值与回退工具
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    /// 单次运行的最大迭代步数（至少 1）
    #[serde(default = "default_max_loops")]
    pub max_loops: usize,
    /// 接受动作所需的最低置信度，低于则使用回退动作
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// 低置信度时改调的工具名；未设置时回退为固定子目标
    pub fallback_tool: Option<String>,
}

fn default_max_loops() -> usize {
    15
}

fn default_confidence_threshold() -> f32 {
    0.7
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_loops: default_max_loops(),
            confidence_threshold: default_confidence_threshold(),
            fallback_tool: None,
        }
    }
}

/// [llm] 段：后端选择；provider=mock 时不访问网络
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 嵌入模型名；未设置时长期检索退化为关键词匹配
    pub embedding_model: Option<String>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            embedding_model: None,
        }
    }
}

/// [tools] 段：重试、超时、退避与缓存开关
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次逻辑调用内的最大尝试次数（至少 1）
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 单次尝试超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
    /// 两次尝试间的固定等待（毫秒）
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default)]
    pub hackernews: HackerNewsSection,
}

fn default_max_retries() -> u32 {
    3
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_secs: default_tool_timeout_secs(),
            backoff_ms: default_backoff_ms(),
            cache_enabled: default_cache_enabled(),
            hackernews: HackerNewsSection::default(),
        }
    }
}

/// [tools.hackernews] 段：HTTP 超时与结果大小限制
#[derive(Debug, Clone, Deserialize)]
pub struct HackerNewsSection {
    #[serde(default = "default_hn_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_hn_max_result_chars")]
    pub max_result_chars: usize,
}

fn default_hn_timeout_secs() -> u64 {
    15
}

fn default_hn_max_result_chars() -> usize {
    4000
}

impl Default for HackerNewsSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_hn_timeout_secs(),
            max_result_chars: default_hn_max_result_chars(),
        }
    }
}

/// [memory] 段：短期 / 长期容量与检索条数
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySection {
    #[serde(default = "default_max_short_term")]
    pub max_short_term: usize,
    #[serde(default = "default_max_long_term")]
    pub max_long_term: usize,
    /// 每轮拼入 prompt 的长期检索条数上限
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_max_short_term() -> usize {
    20
}

fn default_max_long_term() -> usize {
    1000
}

fn default_top_k() -> usize {
    5
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            max_short_term: default_max_short_term(),
            max_long_term: default_max_long_term(),
            top_k: default_top_k(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: AgentSection::default(),
            llm: LlmSection::default(),
            tools: ToolsSection::default(),
            memory: MemorySection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 WASP__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WASP__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WASP")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.agent.max_loops, 15);
        assert!((cfg.agent.confidence_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.tools.max_retries, 3);
        assert!(cfg.tools.cache_enabled);
        assert_eq!(cfg.memory.max_short_term, 20);
        assert_eq!(cfg.memory.top_k, 5);
        assert!(cfg.agent.fallback_tool.is_none());
    }
}

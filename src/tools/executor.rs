//! 工具执行器
//!
//! 包装单个工具：以原始输入为键的结果缓存（只由 clear_cache 失效）、按序前/后处理器、
//! 带固定退避的有界重试、单次尝试超时；一次逻辑调用只更新一次统计；
//! 每次调用输出结构化审计日志（JSON）。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::time::{sleep, timeout};

use crate::core::ToolError;
use crate::tools::Tool;

/// 输入/输出处理器：按注册顺序应用
pub type Processor = Box<dyn Fn(String) -> String + Send + Sync>;

/// 重试退避策略：尝试次数与两次尝试间的等待，独立于调度模型
#[derive(Clone, Debug)]
pub struct BackoffPolicy {
    max_retries: u32,
    delay: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// 第 attempt 次尝试失败后的等待时长（固定间隔）
    pub fn delay_for(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// 单个工具的使用统计：一次逻辑调用只更新一次，重试不重复计数
#[derive(Clone, Debug, Default)]
pub struct ToolStats {
    pub usage_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub last_used: Option<DateTime<Utc>>,
    pub average_response_time: Duration,
}

impl ToolStats {
    /// 增量均值：avg' = (avg * (n-1) + elapsed) / n，n 为本次调用后的 usage_count
    fn record(&mut self, success: bool, elapsed: Duration) {
        self.usage_count += 1;
        if success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
        self.last_used = Some(Utc::now());
        let n = self.usage_count as f64;
        let prev = self.average_response_time.as_secs_f64();
        self.average_response_time = Duration::from_secs_f64((prev * (n - 1.0) + elapsed.as_secs_f64()) / n);
    }
}

/// 工具执行器：对单个工具施加缓存、前后处理、重试与超时，独占其缓存与统计
pub struct ToolExecutor {
    tool: Arc<dyn Tool>,
    cache_enabled: bool,
    cache: HashMap<String, String>,
    pre_processors: Vec<Processor>,
    post_processors: Vec<Processor>,
    backoff: BackoffPolicy,
    timeout: Duration,
    stats: ToolStats,
}

impl ToolExecutor {
    pub fn new(tool: Arc<dyn Tool>, timeout: Duration, backoff: BackoffPolicy) -> Self {
        Self {
            tool,
            cache_enabled: true,
            cache: HashMap::new(),
            pre_processors: Vec::new(),
            post_processors: Vec::new(),
            backoff,
            timeout,
            stats: ToolStats::default(),
        }
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn add_pre_processor(&mut self, processor: impl Fn(String) -> String + Send + Sync + 'static) {
        self.pre_processors.push(Box::new(processor));
    }

    pub fn add_post_processor(&mut self, processor: impl Fn(String) -> String + Send + Sync + 'static) {
        self.post_processors.push(Box::new(processor));
    }

    pub fn tool_name(&self) -> &str {
        self.tool.name()
    }

    pub fn description(&self) -> &str {
        self.tool.description()
    }

    pub fn stats(&self) -> &ToolStats {
        &self.stats
    }

    /// 清空结果缓存（缓存没有容量与时间上限，这是唯一的失效途径）
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// 执行一次逻辑调用：缓存命中直接返回（不计入统计）；
    /// 否则预处理、带退避重试（每次尝试限时）、后处理、写缓存，最后统计一次
    pub async fn call(&mut self, input: &str) -> Result<String, ToolError> {
        if self.cache_enabled {
            if let Some(hit) = self.cache.get(input) {
                tracing::debug!(tool = self.tool.name(), "tool cache hit");
                return Ok(hit.clone());
            }
        }

        let start = Instant::now();
        let mut processed = input.to_string();
        for p in &self.pre_processors {
            processed = p(processed);
        }

        let mut last_error = ToolError::execution(self.tool.name(), "not attempted");
        let mut outcome: Option<String> = None;
        for attempt in 1..=self.backoff.max_retries() {
            match timeout(self.timeout, self.tool.call(&processed)).await {
                Ok(Ok(result)) => {
                    outcome = Some(result);
                    break;
                }
                Ok(Err(e)) => last_error = e,
                Err(_) => {
                    last_error = ToolError::timeout(
                        self.tool.name(),
                        format!("attempt timed out after {:?}", self.timeout),
                    )
                }
            }
            if attempt < self.backoff.max_retries() {
                sleep(self.backoff.delay_for(attempt)).await;
            }
        }

        let elapsed = start.elapsed();
        match outcome {
            Some(mut result) => {
                for p in &self.post_processors {
                    result = p(result);
                }
                if self.cache_enabled {
                    self.cache.insert(input.to_string(), result.clone());
                }
                self.stats.record(true, elapsed);
                self.audit(true, "ok", elapsed, input);
                Ok(result)
            }
            None => {
                self.stats.record(false, elapsed);
                self.audit(false, &last_error.kind.to_string(), elapsed, input);
                Err(last_error)
            }
        }
    }

    fn audit(&self, ok: bool, outcome: &str, elapsed: Duration, input: &str) {
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": self.tool.name(),
            "ok": ok,
            "outcome": outcome,
            "duration_ms": elapsed.as_millis() as u64,
            "input_preview": input_preview(input),
        });
        tracing::info!(audit = %audit.to_string(), "tool");
    }
}

fn input_preview(input: &str) -> String {
    if input.len() > 200 {
        format!("{}...", input.chars().take(200).collect::<String>())
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolErrorKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 计数工具：记录被真正调用的次数，可配置前 fail_first 次失败
    struct CountingTool {
        calls: Arc<AtomicUsize>,
        fail_first: usize,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "counting"
        }

        fn description(&self) -> &str {
            "Counts invocations (for testing)."
        }

        async fn call(&self, input: &str) -> Result<String, ToolError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                Err(ToolError::execution(self.name(), format!("boom #{n}")))
            } else {
                Ok(format!("ok: {input}"))
            }
        }
    }

    /// 慢工具：每次调用睡 5 秒
    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Sleeps for five seconds (for testing)."
        }

        async fn call(&self, _input: &str) -> Result<String, ToolError> {
            sleep(Duration::from_secs(5)).await;
            Ok("done".to_string())
        }
    }

    fn fast_backoff(max_retries: u32) -> BackoffPolicy {
        BackoffPolicy::new(max_retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_cache_hit_skips_tool_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tool = Arc::new(CountingTool {
            calls: calls.clone(),
            fail_first: 0,
        });
        let mut exec = ToolExecutor::new(tool, Duration::from_secs(1), fast_backoff(3));

        let first = exec.call("hello").await.unwrap();
        let second = exec.call("hello").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // 不同输入不是同一个缓存键
        exec.call("other").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_disabled_reinvokes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tool = Arc::new(CountingTool {
            calls: calls.clone(),
            fail_first: 0,
        });
        let mut exec =
            ToolExecutor::new(tool, Duration::from_secs(1), fast_backoff(3)).with_cache(false);

        exec.call("hello").await.unwrap();
        exec.call("hello").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(exec.stats().usage_count, 2);
    }

    #[tokio::test]
    async fn test_clear_cache_reinvokes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tool = Arc::new(CountingTool {
            calls: calls.clone(),
            fail_first: 0,
        });
        let mut exec = ToolExecutor::new(tool, Duration::from_secs(1), fast_backoff(3));

        exec.call("hello").await.unwrap();
        exec.clear_cache();
        exec.call("hello").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_then_success_counts_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tool = Arc::new(CountingTool {
            calls: calls.clone(),
            fail_first: 2,
        });
        let mut exec = ToolExecutor::new(tool, Duration::from_secs(1), fast_backoff(3));

        let result = exec.call("x").await.unwrap();
        assert_eq!(result, "ok: x");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(exec.stats().usage_count, 1);
        assert_eq!(exec.stats().success_count, 1);
        assert_eq!(exec.stats().error_count, 0);
        assert!(exec.stats().last_used.is_some());
    }

    #[tokio::test]
    async fn test_all_attempts_fail_counts_one_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tool = Arc::new(CountingTool {
            calls: calls.clone(),
            fail_first: 99,
        });
        let mut exec = ToolExecutor::new(tool, Duration::from_secs(1), fast_backoff(3));

        let err = exec.call("x").await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Execution);
        // 最后一次观察到的错误信息
        assert!(err.message.contains("boom #3"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(exec.stats().usage_count, 1);
        assert_eq!(exec.stats().success_count, 0);
        assert_eq!(exec.stats().error_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tool_times_out_with_timeout_kind() {
        let mut exec = ToolExecutor::new(
            Arc::new(SlowTool),
            Duration::from_secs(1),
            BackoffPolicy::new(2, Duration::from_millis(10)),
        );

        let err = exec.call("x").await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Timeout);
        assert_eq!(exec.stats().error_count, 1);
        assert_eq!(exec.stats().usage_count, 1);
    }

    #[tokio::test]
    async fn test_processors_apply_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tool = Arc::new(CountingTool {
            calls,
            fail_first: 0,
        });
        let mut exec = ToolExecutor::new(tool, Duration::from_secs(1), fast_backoff(1));
        exec.add_pre_processor(|s| s.trim().to_string());
        exec.add_pre_processor(|s| s.to_uppercase());
        exec.add_post_processor(|s| format!("[{s}]"));

        let result = exec.call("  hi  ").await.unwrap();
        assert_eq!(result, "[ok: HI]");
    }

    #[tokio::test]
    async fn test_average_response_time_incremental_mean() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tool = Arc::new(CountingTool {
            calls,
            fail_first: 0,
        });
        let mut exec =
            ToolExecutor::new(tool, Duration::from_secs(1), fast_backoff(1)).with_cache(false);

        exec.call("a").await.unwrap();
        exec.call("b").await.unwrap();
        assert_eq!(exec.stats().usage_count, 2);
        // 两次快速调用的均值仍应远小于超时上限
        assert!(exec.stats().average_response_time < Duration::from_secs(1));
    }
}

//! 记忆层：短期（事件日志）与长期（键值检索），由 MemoryStore 统一供编排层读写

pub mod long_term;
pub mod short_term;

use std::collections::HashMap;
use std::sync::Arc;

use crate::llm::EmbeddingProvider;

pub use long_term::{LongTermEntry, LongTermMemory};
pub use short_term::{ShortTermEntry, ShortTermMemory};

/// 记忆门面：短期 + 长期，供编排层单一入口写入与拼 prompt 段落
pub struct MemoryStore {
    pub short_term: ShortTermMemory,
    pub long_term: LongTermMemory,
}

impl MemoryStore {
    pub fn new(max_short_term: usize, max_long_term: usize) -> Self {
        Self {
            short_term: ShortTermMemory::new(max_short_term),
            long_term: LongTermMemory::new(max_long_term),
        }
    }

    /// 注入嵌入提供方：长期检索由关键词匹配升级为余弦相似度
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.long_term = self.long_term.with_embedder(embedder);
        self
    }

    pub fn add_short_term(
        &mut self,
        thought: impl Into<String>,
        action: impl Into<String>,
        result: impl Into<String>,
        metadata: HashMap<String, String>,
    ) {
        self.short_term.add(thought, action, result, metadata);
    }

    pub async fn add_long_term(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        metadata: HashMap<String, String>,
    ) {
        self.long_term.add(key, value, metadata).await;
    }

    pub async fn get_relevant(&self, query: &str, top_k: usize) -> Vec<&LongTermEntry> {
        self.long_term.get_relevant(query, top_k).await
    }

    /// 构建供 Planner 使用的 Recent Steps 段落（短期）
    pub fn short_term_section(&self) -> String {
        self.short_term.to_prompt_section()
    }

    /// 构建长期记忆检索段落（Relevant Past Knowledge）
    pub async fn relevant_section(&self, query: &str, top_k: usize) -> String {
        let hits = self.long_term.get_relevant(query, top_k).await;
        if hits.is_empty() {
            return String::new();
        }
        let block = hits
            .iter()
            .map(|e| e.value.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        format!("## Relevant Past Knowledge\n{block}\n")
    }
}

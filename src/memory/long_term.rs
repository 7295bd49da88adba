//! 长期记忆：有界键值存储与相关性检索
//!
//! FIFO 窗口；注入 EmbeddingProvider 时按余弦相似度排序，未注入（或查询编码失败）时
//! 退化为大小写无关的关键词包含匹配，两种模式共用同一接口。
//! 淘汰条目时同步删除其 embedding，保证每个 embedding 键对应且只对应一条存活条目。

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::llm::EmbeddingProvider;

/// 一条长期记忆：键、值、时间戳与元数据；embedding 存于旁路映射
#[derive(Clone, Debug)]
pub struct LongTermEntry {
    pub key: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

/// 长期记忆窗口：固定容量 FIFO，支持相似度 / 关键词两种检索模式
pub struct LongTermMemory {
    entries: VecDeque<LongTermEntry>,
    embeddings: HashMap<String, Vec<f32>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    max_entries: usize,
}

/// 将文本切分为小写词列表，用于关键词包含匹配
fn tokenize_lower(s: &str) -> Vec<String> {
    s.split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 1)
        .collect()
}

/// 余弦相似度
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

impl LongTermMemory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            embeddings: HashMap::new(),
            embedder: None,
            max_entries,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// 写入一条记忆；键已存在时替换旧条目（保持 embedding 键唯一）。
    /// 编码失败只降级为无 embedding，不阻止写入。
    pub async fn add(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        metadata: HashMap<String, String>,
    ) {
        let key = key.into();
        let value = value.into();

        if let Some(pos) = self.entries.iter().position(|e| e.key == key) {
            self.entries.remove(pos);
            self.embeddings.remove(&key);
        }

        if let Some(ref embedder) = self.embedder {
            match embedder.embed(&value).await {
                Ok(v) if !v.is_empty() => {
                    self.embeddings.insert(key.clone(), v);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "embedding skipped");
                }
            }
        }

        self.entries.push_back(LongTermEntry {
            key,
            value,
            timestamp: Utc::now(),
            metadata,
        });

        while self.entries.len() > self.max_entries {
            if let Some(old) = self.entries.pop_front() {
                self.embeddings.remove(&old.key);
            }
        }
    }

    /// 检索与查询最相关的 top_k 条，按相似度降序，分数相同时更新的在前。
    /// 有 embedder 且查询编码成功时用余弦相似度，否则用关键词包含匹配。
    pub async fn get_relevant(&self, query: &str, top_k: usize) -> Vec<&LongTermEntry> {
        let query_embedding = match self.embedder {
            Some(ref embedder) => match embedder.embed(query).await {
                Ok(v) if !v.is_empty() => Some(v),
                _ => None,
            },
            None => None,
        };

        // 从最新条目开始收集，稳定排序后同分条目保持最近者在前
        let mut scored: Vec<(f32, &LongTermEntry)> = self
            .entries
            .iter()
            .rev()
            .map(|entry| (self.score(entry, query, query_embedding.as_deref()), entry))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored.into_iter().take(top_k).map(|(_, e)| e).collect()
    }

    fn score(&self, entry: &LongTermEntry, query: &str, query_embedding: Option<&[f32]>) -> f32 {
        if let Some(qe) = query_embedding {
            return self
                .embeddings
                .get(&entry.key)
                .map(|e| cosine_similarity(qe, e))
                .unwrap_or(0.0);
        }
        // 降级模式：查询词在值文本中的包含个数
        let value_lower = entry.value.to_lowercase();
        tokenize_lower(query)
            .iter()
            .filter(|token| value_lower.contains(token.as_str()))
            .count() as f32
    }

    pub fn entries(&self) -> impl Iterator<Item = &LongTermEntry> {
        self.entries.iter()
    }

    /// embedding 键数量（测试淘汰不变量用）
    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }

    pub fn has_embedding(&self, key: &str) -> bool {
        self.embeddings.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! HackerNews 搜索工具：Algolia API、超时、结果条数与大小限制
//!
//! 查询 hn.algolia.com 的 story 索引，返回前几条的标题 / 链接 / 分数 / 评论数；
//! 响应超过 max_result_chars 时截断并追加 ...[truncated]。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::ToolError;
use crate::tools::Tool;

const ENDPOINT: &str = "https://hn.algolia.com/api/v1/search";
const MAX_HITS: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    url: Option<String>,
    points: Option<i64>,
    num_comments: Option<i64>,
}

/// HackerNews 搜索工具：输入为纯文本查询
pub struct HackerNewsTool {
    client: Client,
    max_result_chars: usize,
}

impl HackerNewsTool {
    pub fn new(timeout_secs: u64, max_result_chars: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("wasp-agent/0.1")
            .build()
            .unwrap_or_default();
        Self {
            client,
            max_result_chars,
        }
    }

    async fn search(&self, query: &str) -> Result<String, String> {
        let resp = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("query", query),
                ("tags", "story"),
                ("hitsPerPage", "5"),
            ])
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| format!("Decode body: {}", e))?;
        if parsed.hits.is_empty() {
            return Ok("No results found.".to_string());
        }

        let mut out = String::new();
        for hit in parsed.hits.iter().take(MAX_HITS) {
            out.push_str(&format!(
                "Title: {}\nURL: {}\nPoints: {}\nComments: {}\n\n",
                hit.title.as_deref().unwrap_or("N/A"),
                hit.url.as_deref().unwrap_or("N/A"),
                hit.points.unwrap_or(0),
                hit.num_comments.unwrap_or(0),
            ));
        }

        let len = out.chars().count();
        if len > self.max_result_chars {
            Ok(out.chars().take(self.max_result_chars).collect::<String>() + "\n...[truncated]")
        } else {
            Ok(out)
        }
    }
}

#[async_trait]
impl Tool for HackerNewsTool {
    fn name(&self) -> &str {
        "hackernews"
    }

    fn description(&self) -> &str {
        "Search Hacker News stories. Input is a plain search query."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ToolError::validation(self.name(), "Missing search query"));
        }
        tracing::info!(query = %query, "hackernews tool search");
        self.search(query)
            .await
            .map_err(|e| ToolError::execution(self.name(), e))
    }
}

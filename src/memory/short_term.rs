//! 短期记忆：最近执行动作的有界事件日志
//!
//! 每执行一个动作由编排层追加一条（思考 / 动作标签 / 结果）；纯 FIFO 窗口，
//! 超出 max_entries 时淘汰最旧的条目。

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

/// 一条短期记忆：某次动作的思考、动作标签、结果与时间戳
#[derive(Clone, Debug)]
pub struct ShortTermEntry {
    pub thought: String,
    pub action: String,
    pub result: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

/// 短期记忆窗口：固定容量 FIFO，保留最近的条目
#[derive(Debug)]
pub struct ShortTermMemory {
    entries: VecDeque<ShortTermEntry>,
    max_entries: usize,
}

impl ShortTermMemory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    pub fn add(
        &mut self,
        thought: impl Into<String>,
        action: impl Into<String>,
        result: impl Into<String>,
        metadata: HashMap<String, String>,
    ) {
        self.entries.push_back(ShortTermEntry {
            thought: thought.into(),
            action: action.into(),
            result: result.into(),
            timestamp: Utc::now(),
            metadata,
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ShortTermEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 构建供 Planner 使用的 Recent Steps 段落
    pub fn to_prompt_section(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut s = String::from("## Recent Steps\n");
        for e in &self.entries {
            s.push_str(&format!(
                "- Thought: {} | Action: {} | Result: {}\n",
                e.thought, e.action, e.result
            ));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_n(mem: &mut ShortTermMemory, n: usize) {
        for i in 1..=n {
            mem.add(
                format!("thought-{i}"),
                format!("action-{i}"),
                format!("result-{i}"),
                HashMap::new(),
            );
        }
    }

    #[test]
    fn test_fifo_bound_and_retention() {
        let mut mem = ShortTermMemory::new(3);
        add_n(&mut mem, 4);
        assert_eq!(mem.len(), 3);
        let actions: Vec<&str> = mem.entries().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["action-2", "action-3", "action-4"]);
    }

    #[test]
    fn test_count_never_exceeds_capacity() {
        let mut mem = ShortTermMemory::new(5);
        add_n(&mut mem, 50);
        assert_eq!(mem.len(), 5);
        let actions: Vec<&str> = mem.entries().map(|e| e.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["action-46", "action-47", "action-48", "action-49", "action-50"]
        );
    }

    #[test]
    fn test_prompt_section() {
        let mut mem = ShortTermMemory::new(3);
        assert!(mem.to_prompt_section().is_empty());
        add_n(&mut mem, 1);
        let section = mem.to_prompt_section();
        assert!(section.starts_with("## Recent Steps"));
        assert!(section.contains("action-1"));
    }
}

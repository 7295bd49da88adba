//! 动作解析：从 LLM 原始文本提取结构化动作
//!
//! 优先级：Final Answer 标记最高（其后全部文本为答案，即使前面还有 Action 块）；
//! 其次是 Action / Action Input 块（只认第一个匹配）；再次是 Sub-Goal 标记；
//! 三者皆无时报 ParseError，对整次运行致命。

use std::sync::OnceLock;

use regex::Regex;

use crate::core::AgentError;

pub const FINAL_ANSWER_TOKEN: &str = "Final Answer:";
pub const OBSERVATION_TOKEN: &str = "Observation:";
pub const SUB_GOAL_TOKEN: &str = "Sub-Goal:";
pub const THOUGHT_TOKEN: &str = "Thought:";

/// 一次循环迭代产出的动作：只消费一次，从不修改
#[derive(Debug, Clone)]
pub struct Action {
    pub kind: ActionKind,
    /// 动作前最后一个 Thought 段的内容
    pub thought: Option<String>,
    /// 由 ConfidenceScorer 填充，范围 [0,1]
    pub confidence: f32,
}

/// 动作类别：调用工具 / 拆出子目标 / 给出最终答案
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    ToolCall { tool: String, input: String },
    SubGoal(String),
    FinalAnswer(String),
}

impl Action {
    fn new(kind: ActionKind, thought: Option<String>) -> Self {
        Self {
            kind,
            thought,
            confidence: 0.0,
        }
    }

    /// 写入短期记忆的动作标签
    pub fn label(&self) -> String {
        match &self.kind {
            ActionKind::ToolCall { tool, input } => format!("{tool}: {input}"),
            ActionKind::SubGoal(goal) => format!("sub_goal: {goal}"),
            ActionKind::FinalAnswer(_) => "final_answer".to_string(),
        }
    }
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action:\s*\[?(.*?)\]?\s*Action Input:\s*(.*)")
            .expect("action regex is valid")
    })
}

/// 动作前最后一个 Thought 段：取最后一次 Thought 标记之后、下一个标记之前的文本
fn extract_thought(raw: &str) -> Option<String> {
    let idx = raw.rfind(THOUGHT_TOKEN)?;
    let mut rest = &raw[idx + THOUGHT_TOKEN.len()..];
    for marker in ["Action:", FINAL_ANSWER_TOKEN, SUB_GOAL_TOKEN, OBSERVATION_TOKEN] {
        if let Some(cut) = rest.find(marker) {
            rest = &rest[..cut];
        }
    }
    let thought = rest.trim();
    if thought.is_empty() {
        None
    } else {
        Some(thought.to_string())
    }
}

/// 解析 LLM 输出为动作；置信度由 ConfidenceScorer 另行计算
pub fn parse_action(raw: &str) -> Result<Action, AgentError> {
    let thought = extract_thought(raw);

    // Final Answer 优先：取最后一次出现之后的全部文本
    if let Some(idx) = raw.rfind(FINAL_ANSWER_TOKEN) {
        let payload = raw[idx + FINAL_ANSWER_TOKEN.len()..].trim();
        return Ok(Action::new(
            ActionKind::FinalAnswer(payload.to_string()),
            thought,
        ));
    }

    if let Some(caps) = action_regex().captures(raw) {
        let tool = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let mut input = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        // 只认第一个动作块：输入在下一个 Action / Observation 标记处截断
        for marker in ["\nAction:", "\nObservation:"] {
            if let Some(cut) = input.find(marker) {
                input = &input[..cut];
            }
        }
        let input = input.trim().trim_matches('"').to_string();
        if !tool.is_empty() {
            return Ok(Action::new(
                ActionKind::ToolCall {
                    tool: tool.to_string(),
                    input,
                },
                thought,
            ));
        }
    }

    if let Some(idx) = raw.rfind(SUB_GOAL_TOKEN) {
        let goal = raw[idx + SUB_GOAL_TOKEN.len()..].trim();
        if !goal.is_empty() {
            return Ok(Action::new(ActionKind::SubGoal(goal.to_string()), thought));
        }
    }

    Err(AgentError::ParseError(format!(
        "LLM output is not parsable into an action: `{raw}`"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_call_block() {
        let raw = "Thought: plan\nAction: Search\nAction Input: capital of France";
        let action = parse_action(raw).unwrap();
        assert_eq!(
            action.kind,
            ActionKind::ToolCall {
                tool: "Search".to_string(),
                input: "capital of France".to_string(),
            }
        );
        assert_eq!(action.thought.as_deref(), Some("plan"));
    }

    #[test]
    fn test_parse_bracketed_tool_name_and_quotes() {
        let raw = "Action: [echo]\nAction Input: \"hello\"";
        let action = parse_action(raw).unwrap();
        assert_eq!(
            action.kind,
            ActionKind::ToolCall {
                tool: "echo".to_string(),
                input: "hello".to_string(),
            }
        );
    }

    #[test]
    fn test_final_answer_wins_over_action_block() {
        let raw = "Thought: ready\nAction: Search\nAction Input: x\nThought: done\nFinal Answer: Paris";
        let action = parse_action(raw).unwrap();
        assert_eq!(action.kind, ActionKind::FinalAnswer("Paris".to_string()));
    }

    #[test]
    fn test_final_answer_takes_text_after_last_marker() {
        let raw = "Final Answer: draft\nFinal Answer: Paris";
        let action = parse_action(raw).unwrap();
        assert_eq!(action.kind, ActionKind::FinalAnswer("Paris".to_string()));
    }

    #[test]
    fn test_only_first_action_block_is_honored() {
        let raw = "Action: first\nAction Input: one\nAction: second\nAction Input: two";
        let action = parse_action(raw).unwrap();
        assert_eq!(
            action.kind,
            ActionKind::ToolCall {
                tool: "first".to_string(),
                input: "one".to_string(),
            }
        );
    }

    #[test]
    fn test_sub_goal_marker() {
        let raw = "Thought: too broad\nSub-Goal: find the relevant document first";
        let action = parse_action(raw).unwrap();
        assert_eq!(
            action.kind,
            ActionKind::SubGoal("find the relevant document first".to_string())
        );
    }

    #[test]
    fn test_unparsable_output_is_parse_error() {
        let err = parse_action("I have no idea what to do").unwrap_err();
        assert!(matches!(err, AgentError::ParseError(_)));
    }

    #[test]
    fn test_thought_extraction_takes_last_thought() {
        let raw = "Thought: first\nAction: a\nAction Input: x\nThought: second\nFinal Answer: done";
        let action = parse_action(raw).unwrap();
        assert_eq!(action.thought.as_deref(), Some("second"));
    }
}

//! Planner：拼装 prompt 并调用 LLM 生成下一步动作文本
//!
//! prompt 由基础模板、工具清单、记忆段落与此前各轮的 动作/Observation 记录组成；
//! stop 序列阻止模型自行编造 Observation。置信度由可插拔的 ConfidenceScorer 独立计算，
//! 与解析语法无关。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::react::{Action, ActionKind, OBSERVATION_TOKEN};

/// 置信度评分：独立于语法，可插拔（如换成 logprobs 来源的实现）
pub trait ConfidenceScorer: Send + Sync {
    /// 对原始输出与解析出的动作打分，范围 [0,1]
    fn score(&self, raw: &str, action: &Action) -> f32;
}

/// 默认启发式评分：最终答案与带输入的工具调用高置信，空载荷与过短输出减分
#[derive(Debug, Default)]
pub struct HeuristicScorer;

impl ConfidenceScorer for HeuristicScorer {
    fn score(&self, raw: &str, action: &Action) -> f32 {
        let mut score: f32 = match &action.kind {
            ActionKind::FinalAnswer(answer) => {
                if answer.trim().is_empty() {
                    0.2
                } else {
                    0.9
                }
            }
            ActionKind::ToolCall { input, .. } => {
                if input.trim().is_empty() {
                    0.4
                } else {
                    0.8
                }
            }
            ActionKind::SubGoal(_) => 0.6,
        };
        if action.thought.is_some() {
            score += 0.1;
        }
        if raw.trim().len() < 8 {
            score -= 0.2;
        }
        score.clamp(0.0, 1.0)
    }
}

/// 默认 prompt 模板（Thought / Action / Action Input / Observation 格式）
const PROMPT_TEMPLATE: &str = "\
You can use tools to get new information.
{memory_context}{recent_steps}
Answer the question as best as you can using the following tools:

{tool_description}

Use the following format:

Question: the input question you must answer
Thought: comment on what you want to do next
Action: the action to take, exactly one element of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation repeats N times, use it until you are sure of the answer)
Thought: I now know the final answer
Final Answer: your final answer to the original input question

Begin!

Question: {question}
Thought: {previous_responses}";

/// 单次规划的上下文素材：问题、工具清单、记忆段落与此前各轮记录
pub struct PromptContext<'a> {
    pub question: &'a str,
    pub tools: &'a [(String, String)],
    /// 长期记忆检索段落（可为空）
    pub memory_context: &'a str,
    /// 短期记忆段落（可为空）
    pub recent_steps: &'a str,
    pub previous_responses: &'a [String],
}

/// Planner：持有 LLM 与 prompt 模板，负责渲染并调用 generate
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    prompt_template: String,
    stop_sequences: Vec<String>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            prompt_template: PROMPT_TEMPLATE.to_string(),
            stop_sequences: vec![
                format!("\n{OBSERVATION_TOKEN}"),
                format!("\n\t{OBSERVATION_TOKEN}"),
            ],
        }
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 渲染 prompt 并调用 LLM；LLM 失败对整次运行致命，这里不重试
    pub async fn plan(&self, ctx: &PromptContext<'_>) -> Result<String, AgentError> {
        let prompt = self.render(ctx);
        Ok(self.llm.generate(&prompt, &self.stop_sequences).await?)
    }

    fn render(&self, ctx: &PromptContext<'_>) -> String {
        let tool_description = ctx
            .tools
            .iter()
            .map(|(name, desc)| format!("{name}: {desc}"))
            .collect::<Vec<_>>()
            .join("\n");
        let tool_names = ctx
            .tools
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.prompt_template
            .replace("{memory_context}", ctx.memory_context)
            .replace("{recent_steps}", ctx.recent_steps)
            .replace("{tool_description}", &tool_description)
            .replace("{tool_names}", &tool_names)
            .replace("{question}", ctx.question)
            .replace("{previous_responses}", &ctx.previous_responses.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::react::parse_action;

    fn scored(raw: &str) -> f32 {
        let mut action = parse_action(raw).unwrap();
        action.confidence = HeuristicScorer.score(raw, &action);
        action.confidence
    }

    #[test]
    fn test_scorer_rewards_final_answer_with_thought() {
        let with_thought = scored("Thought: sure\nFinal Answer: Paris");
        let without = scored("Final Answer: Paris");
        assert!(with_thought > without);
        assert!(with_thought >= 0.9);
    }

    #[test]
    fn test_scorer_penalizes_empty_tool_input() {
        let empty = scored("Action: echo\nAction Input:");
        let filled = scored("Action: echo\nAction Input: hi");
        assert!(empty < filled);
        assert!(empty < 0.7);
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        for raw in [
            "Thought: a\nFinal Answer: b",
            "Action: t\nAction Input: x",
            "Thought: plan\nSub-Goal: split the work",
        ] {
            let s = scored(raw);
            assert!((0.0..=1.0).contains(&s), "score {s} out of range");
        }
    }

    #[test]
    fn test_render_fills_placeholders() {
        let planner = Planner::new(std::sync::Arc::new(MockLlmClient::repeating("x")));
        let tools = vec![("echo".to_string(), "Echo tool".to_string())];
        let prompt = planner.render(&PromptContext {
            question: "What is 2+2?",
            tools: &tools,
            memory_context: "## Relevant Past Knowledge\nfour\n",
            recent_steps: "",
            previous_responses: &["Thought: thinking".to_string()],
        });
        assert!(prompt.contains("echo: Echo tool"));
        assert!(prompt.contains("exactly one element of [echo]"));
        assert!(prompt.contains("Question: What is 2+2?"));
        assert!(prompt.contains("four"));
        assert!(prompt.ends_with("Thought: Thought: thinking"));
    }
}

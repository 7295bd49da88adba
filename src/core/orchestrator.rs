//! 编排主循环
//!
//! 拼上下文 -> 规划动作 ->（低置信度回退）-> 执行 -> 写记忆与进度 -> 判停。
//! 工具失败转为 Observation 文本进入下一轮上下文；解析与 LLM 失败对整次运行致命；
//! 进度满格或步数耗尽时返回尽力合成的答案而不报错。

use std::collections::HashMap;

use crate::core::{AgentError, GoalTracker};
use crate::memory::MemoryStore;
use crate::react::{
    parse_action, Action, ActionKind, ConfidenceScorer, HeuristicScorer, Planner, PromptContext,
    OBSERVATION_TOKEN, THOUGHT_TOKEN,
};
use crate::tools::{ToolChainRunner, ToolStats};

/// 低置信度时的确定性回退动作：指定工具或默认子目标
#[derive(Clone, Debug)]
pub enum FallbackAction {
    /// 用当前问题作为输入调用指定工具
    Tool(String),
    /// 记录一个固定子目标，提示模型分解任务
    SubGoal(String),
}

impl Default for FallbackAction {
    fn default() -> Self {
        FallbackAction::SubGoal("Break the task into smaller steps and try again".to_string())
    }
}

/// 编排器：独占目标与记忆，驱动 生成-执行-更新 循环；一次只有一个在途动作
pub struct Orchestrator {
    planner: Planner,
    tools: ToolChainRunner,
    memory: MemoryStore,
    goal: GoalTracker,
    scorer: Box<dyn ConfidenceScorer>,
    fallback: FallbackAction,
    max_loops: usize,
    confidence_threshold: f32,
    top_k: usize,
}

impl Orchestrator {
    pub fn new(planner: Planner, tools: ToolChainRunner, memory: MemoryStore) -> Self {
        Self {
            planner,
            tools,
            memory,
            goal: GoalTracker::new(),
            scorer: Box::new(HeuristicScorer),
            fallback: FallbackAction::default(),
            max_loops: 15,
            confidence_threshold: 0.7,
            top_k: 5,
        }
    }

    pub fn with_max_loops(mut self, max_loops: usize) -> Self {
        self.max_loops = max_loops.max(1);
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackAction) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_scorer(mut self, scorer: impl ConfidenceScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn with_goal_tracker(mut self, goal: GoalTracker) -> Self {
        self.goal = goal;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn goal(&self) -> &GoalTracker {
        &self.goal
    }

    pub fn tools_mut(&mut self) -> &mut ToolChainRunner {
        &mut self.tools
    }

    pub fn tool_stats(&self, name: &str) -> Option<&ToolStats> {
        self.tools.stats(name)
    }

    /// 运行循环直至产生最终答案、进度满格或步数耗尽；后两者返回合成答案
    pub async fn run(&mut self, question: &str) -> Result<String, AgentError> {
        self.goal.set_goal(question);

        let mut previous_responses: Vec<String> = Vec::new();
        let mut last_observation = String::new();

        for step in 0..self.max_loops {
            // BUILD_CONTEXT：短期段落与长期检索段落随每轮记忆更新而变化
            let memory_context = self.memory.relevant_section(question, self.top_k).await;
            let recent_steps = self.memory.short_term_section();
            let raw = self
                .planner
                .plan(&PromptContext {
                    question,
                    tools: self.tools.tool_descriptions(),
                    memory_context: &memory_context,
                    recent_steps: &recent_steps,
                    previous_responses: &previous_responses,
                })
                .await?;

            // GENERATE_ACTION：解析失败致命；置信度独立打分
            let mut action = parse_action(&raw)?;
            action.confidence = self.scorer.score(&raw, &action);
            tracing::debug!(step, confidence = action.confidence, "action generated");

            // 低置信度：换成确定性回退动作（恢复路径，不是错误）
            let action = if action.confidence < self.confidence_threshold {
                tracing::info!(
                    step,
                    confidence = action.confidence,
                    threshold = self.confidence_threshold,
                    "low confidence, using fallback action"
                );
                self.fallback_action(question, action)
            } else {
                action
            };

            // EXECUTE_ACTION
            match &action.kind {
                ActionKind::FinalAnswer(answer) => {
                    let answer = answer.clone();
                    self.record_step(&action, &answer);
                    self.memory
                        .add_long_term(question, answer.clone(), HashMap::new())
                        .await;
                    self.goal.mark_completed();
                    return Ok(answer);
                }
                ActionKind::SubGoal(sub_goal) => {
                    self.goal.add_sub_goal(sub_goal.clone());
                    let observation = format!("Sub-goal recorded: {sub_goal}");
                    self.record_step(&action, &observation);
                    self.goal.advance(true);
                    previous_responses
                        .push(format!("{raw}\n{OBSERVATION_TOKEN} {observation}\n{THOUGHT_TOKEN}"));
                    last_observation = observation;
                }
                ActionKind::ToolCall { tool, input } => {
                    let (observation, succeeded) = match self.tools.call_tool(tool, input).await {
                        Ok(result) => (result, true),
                        // 工具局部失败：转为 Observation 让模型调整，不中止运行
                        Err(e) if e.is_tool_error() => (format!("Error: {e}"), false),
                        Err(e) => return Err(e),
                    };
                    self.record_step(&action, &observation);
                    self.goal.advance(succeeded);
                    previous_responses
                        .push(format!("{raw}\n{OBSERVATION_TOKEN} {observation}\n{THOUGHT_TOKEN}"));
                    last_observation = observation;
                }
            }

            // CHECK_COMPLETION：进度满格时合成答案返回
            if self.goal.is_complete() {
                self.goal.mark_completed();
                return Ok(synthesize_answer(
                    question,
                    &last_observation,
                    "goal progress reached 1.0",
                ));
            }
        }

        // 步数耗尽：尽力合成而不是报错
        Ok(synthesize_answer(
            question,
            &last_observation,
            "loop budget exhausted",
        ))
    }

    /// 低置信度回退：指定工具（用原问题作输入）或默认子目标
    fn fallback_action(&self, question: &str, original: Action) -> Action {
        let kind = match &self.fallback {
            FallbackAction::Tool(name) => ActionKind::ToolCall {
                tool: name.clone(),
                input: question.to_string(),
            },
            FallbackAction::SubGoal(text) => ActionKind::SubGoal(text.clone()),
        };
        Action {
            kind,
            thought: original.thought,
            confidence: 1.0,
        }
    }

    fn record_step(&mut self, action: &Action, result: &str) {
        let mut metadata = HashMap::new();
        metadata.insert("confidence".to_string(), format!("{:.2}", action.confidence));
        self.memory.add_short_term(
            action.thought.clone().unwrap_or_default(),
            action.label(),
            result.to_string(),
            metadata,
        );
    }
}

/// 步数耗尽或进度满格时的合成答案：基于最后一次 Observation，不抛错
fn synthesize_answer(question: &str, last_observation: &str, reason: &str) -> String {
    if last_observation.is_empty() {
        format!("No conclusive answer was reached for \"{question}\" ({reason}).")
    } else {
        format!(
            "Best-effort answer for \"{question}\" based on the last observation ({reason}): {last_observation}"
        )
    }
}

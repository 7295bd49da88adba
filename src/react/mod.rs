//! ReAct 层：动作解析与 Planner

pub mod parser;
pub mod planner;

pub use parser::{
    parse_action, Action, ActionKind, FINAL_ANSWER_TOKEN, OBSERVATION_TOKEN, SUB_GOAL_TOKEN,
    THOUGHT_TOKEN,
};
pub use planner::{ConfidenceScorer, HeuristicScorer, Planner, PromptContext};

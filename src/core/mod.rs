//! 核心编排层：错误、目标追踪与主循环

pub mod error;
pub mod goal;
pub mod orchestrator;

pub use error::{AgentError, ToolError, ToolErrorKind};
pub use goal::{
    DecomposeStrategy, FixedStepProgress, Goal, GoalStatus, GoalTracker, IdentityDecompose,
    ProgressStrategy,
};
pub use orchestrator::{FallbackAction, Orchestrator};

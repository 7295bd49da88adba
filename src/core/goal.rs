//! 目标追踪：主目标、子目标分解与进度
//!
//! 进度每次更新都钳制到 [0,1]；默认 FixedStepProgress 单调不减（成功动作前进一个固定步长），
//! 接口允许替换为可在检测到回退时降低进度的策略（替换方需自行说明）。
//! 分解策略默认原样返回主目标。

use chrono::{DateTime, Utc};

/// 目标状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalStatus {
    InProgress,
    Completed,
    Failed,
}

/// 一次运行的目标：主目标、有序子目标、状态与进度
#[derive(Clone, Debug)]
pub struct Goal {
    pub main_goal: String,
    pub sub_goals: Vec<String>,
    pub status: GoalStatus,
    pub progress: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    fn new(main_goal: String, sub_goals: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            main_goal,
            sub_goals,
            status: GoalStatus::InProgress,
            progress: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 进度推进策略：根据动作成败给出新的进度值（调用方负责钳制到 [0,1]）
pub trait ProgressStrategy: Send + Sync {
    fn next_progress(&self, current: f32, action_succeeded: bool) -> f32;
}

/// 默认策略：成功动作前进固定步长，失败原地不动；单调不减
#[derive(Clone, Debug)]
pub struct FixedStepProgress {
    pub step: f32,
}

impl Default for FixedStepProgress {
    fn default() -> Self {
        Self { step: 0.1 }
    }
}

impl ProgressStrategy for FixedStepProgress {
    fn next_progress(&self, current: f32, action_succeeded: bool) -> f32 {
        if action_succeeded {
            current + self.step
        } else {
            current
        }
    }
}

/// 目标分解策略
pub trait DecomposeStrategy: Send + Sync {
    fn decompose(&self, goal: &str) -> Vec<String>;
}

/// 默认分解：原样返回主目标
#[derive(Debug, Default)]
pub struct IdentityDecompose;

impl DecomposeStrategy for IdentityDecompose {
    fn decompose(&self, goal: &str) -> Vec<String> {
        vec![goal.to_string()]
    }
}

/// 目标追踪器：持有当前目标与可插拔策略，独属于编排层
pub struct GoalTracker {
    goal: Option<Goal>,
    progress_strategy: Box<dyn ProgressStrategy>,
    decompose_strategy: Box<dyn DecomposeStrategy>,
}

impl Default for GoalTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalTracker {
    pub fn new() -> Self {
        Self {
            goal: None,
            progress_strategy: Box::new(FixedStepProgress::default()),
            decompose_strategy: Box::new(IdentityDecompose),
        }
    }

    pub fn with_progress_strategy(mut self, strategy: impl ProgressStrategy + 'static) -> Self {
        self.progress_strategy = Box::new(strategy);
        self
    }

    pub fn with_decompose_strategy(mut self, strategy: impl DecomposeStrategy + 'static) -> Self {
        self.decompose_strategy = Box::new(strategy);
        self
    }

    /// 设定主目标并按策略分解子目标；重复调用会重置目标
    pub fn set_goal(&mut self, text: &str) {
        let sub_goals = self.decompose_strategy.decompose(text);
        self.goal = Some(Goal::new(text.to_string(), sub_goals));
    }

    pub fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    pub fn progress(&self) -> f32 {
        self.goal.as_ref().map(|g| g.progress).unwrap_or(0.0)
    }

    pub fn status(&self) -> Option<GoalStatus> {
        self.goal.as_ref().map(|g| g.status)
    }

    pub fn add_sub_goal(&mut self, sub_goal: impl Into<String>) {
        if let Some(ref mut goal) = self.goal {
            goal.sub_goals.push(sub_goal.into());
            goal.updated_at = Utc::now();
        }
    }

    /// 按增量更新进度，钳制到 [0,1]
    pub fn update_progress(&mut self, delta: f32) {
        if let Some(ref mut goal) = self.goal {
            goal.progress = (goal.progress + delta).clamp(0.0, 1.0);
            goal.updated_at = Utc::now();
        }
    }

    /// 按动作结果推进进度（策略计算新值后钳制；默认 FixedStep 下单调不减）
    pub fn advance(&mut self, action_succeeded: bool) {
        if let Some(ref mut goal) = self.goal {
            let next = self
                .progress_strategy
                .next_progress(goal.progress, action_succeeded);
            goal.progress = next.clamp(0.0, 1.0);
            goal.updated_at = Utc::now();
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn mark_completed(&mut self) {
        if let Some(ref mut goal) = self.goal {
            goal.status = GoalStatus::Completed;
            goal.progress = 1.0;
            goal.updated_at = Utc::now();
        }
    }

    pub fn mark_failed(&mut self) {
        if let Some(ref mut goal) = self.goal {
            goal.status = GoalStatus::Failed;
            goal.updated_at = Utc::now();
        }
    }
}

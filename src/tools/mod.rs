//! 工具层：工具 trait 与注册表、单工具执行器（缓存/重试/超时/统计）、具名工具链

pub mod chain;
pub mod echo;
pub mod executor;
pub mod hackernews;
pub mod registry;

pub use chain::{ExecutorConfig, ToolChainRunner};
pub use echo::EchoTool;
pub use executor::{BackoffPolicy, Processor, ToolExecutor, ToolStats};
pub use hackernews::HackerNewsTool;
pub use registry::{Tool, ToolRegistry};

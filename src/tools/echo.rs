//! Echo 工具（测试用）

use async_trait::async_trait;

use crate::core::ToolError;
use crate::tools::Tool;

/// Echo 工具：原样回显输入文本
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the input text back (for testing)."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        Ok(input.to_string())
    }
}

//! System prompt templates for the agent.

use crate::tools::ToolRegistry;

/// Build the travel-assistant system prompt with tool definitions.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- `{}`\n  {}", t.usage, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"你是一个智能旅行助手。你的任务是分析用户的请求，并使用可用工具一步步地解决问题。

# 可用工具:
{tool_descriptions}

# 行动格式:
你的回答必须严格遵循以下格式。首先是你的思考过程，然后是你要执行的具体行动，每次回复只输出一对Thought-Action：
Thought: [这里是你的思考过程和下一步计划]
Action: [这里是你要调用的工具，格式为 function_name(arg_name="arg_value")]

参数值必须用双引号包裹；如果参数值中包含双引号，请写成 \"。
不要自己编写 Observation，工具的结果会由系统提供。

# 任务完成:
当你收集到足够的信息，能够回答用户的最终问题时，你必须在`Action:`字段后使用 `finish(answer="...")` 来输出最终答案。

请开始吧！"#,
        tool_descriptions = tool_descriptions
    )
}

//! Text Tool-Call Parsing
//!
//! For models without native function calling: tool requests are written as
//! fenced JSON blocks in the reply text.
//!
//! ~~~text
//! ```tool
//! {"tool": "wikipedia_search", "arguments": {"input": "Alan Turing"}}
//! ```
//! ~~~

use std::fmt::Write as _;

use serde::Deserialize;

use crate::message::ToolRequest;
use crate::tool::ToolSchema;

const TOOL_FENCE: &str = "```tool";
const FENCE_END: &str = "```";

#[derive(Deserialize)]
struct TextToolCall {
    tool: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

impl From<TextToolCall> for ToolRequest {
    fn from(call: TextToolCall) -> Self {
        Self::from_arguments(call.tool, &call.arguments)
    }
}

/// Prompt section telling a text-only model how to request tools
pub const TEXT_TOOL_INSTRUCTIONS: &str = "To use a tool, reply with a fenced block in exactly this format:\n```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"input\": \"...\"}}\n```";

/// System prompt section describing `tools` for a text-only model
pub fn prompt_section(tools: &[ToolSchema]) -> String {
    let mut prompt = String::from("## Available Tools\n\n");
    prompt.push_str(TEXT_TOOL_INSTRUCTIONS);
    prompt.push_str("\n\n");

    for schema in tools {
        let _ = writeln!(prompt, "### {}", schema.name);
        let _ = writeln!(prompt, "{}", schema.description);
        let _ = writeln!(prompt, "- `input` (string, required): {}\n", schema.input_description);
    }

    prompt
}

/// Extract every fenced tool block from `content`, in order.
///
/// Falls back to a single inline `{"tool": ...}` object when no fenced block
/// is present. Blocks that fail to parse are skipped.
pub fn parse_tool_requests(content: &str) -> Vec<ToolRequest> {
    let mut requests = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find(TOOL_FENCE) {
        let after_marker = &rest[start + TOOL_FENCE.len()..];
        let Some(end) = after_marker.find(FENCE_END) else {
            break;
        };
        let json_str = after_marker[..end].trim();
        match serde_json::from_str::<TextToolCall>(json_str) {
            Ok(call) => requests.push(call.into()),
            Err(e) => tracing::debug!(error = %e, "Skipping unparsable tool block"),
        }
        rest = &after_marker[end + FENCE_END.len()..];
    }

    if requests.is_empty() {
        requests.extend(parse_inline_tool_call(content));
    }
    requests
}

/// Try to parse an inline JSON tool call
fn parse_inline_tool_call(content: &str) -> Option<ToolRequest> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<TextToolCall>(&content[start..=end])
        .ok()
        .map(Into::into)
}

//! Request/response logging for completion calls.
//!
//! Purely advisory: these functions only emit `tracing` events. Summaries go
//! out at INFO, per-message previews and full bodies at DEBUG.

use relayclaw_core::message::Message;
use relayclaw_core::provider::CompletionResponse;
use tracing::{debug, info};

use crate::backend::BackendCall;

/// Characters kept from each history message.
pub const MESSAGE_PREVIEW_CHARS: usize = 100;

/// Characters kept from the response content.
pub const RESPONSE_PREVIEW_CHARS: usize = 200;

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// One-line summary of a history message.
///
/// Multi-part content is flattened to its text segments; non-text parts add
/// an `[+images]` marker. Content-less assistant turns list their tool calls.
pub fn message_preview(msg: &Message) -> String {
    if !msg.content.is_empty() {
        let mut line = preview(&msg.content.text(), MESSAGE_PREVIEW_CHARS);
        if msg.content.has_non_text() {
            line.push_str(" [+images]");
        }
        return line;
    }

    if msg.tool_calls.is_empty() {
        "[no content]".to_string()
    } else {
        let names: Vec<&str> = msg.tool_calls.iter().map(|tc| tc.name.as_str()).collect();
        format!("[tool_calls: {}]", names.join(", "))
    }
}

pub(crate) fn log_request(call: &BackendCall) {
    info!(
        model = %call.model,
        temperature = call.temperature,
        max_tokens = call.max_tokens,
        api_base = call.api_base.as_deref().unwrap_or("default"),
        messages = call.messages.len(),
        "LLM API request"
    );

    for (index, msg) in call.messages.iter().enumerate() {
        debug!(index, role = msg.role.as_str(), preview = %message_preview(msg), "Request message");
    }

    match &call.tools {
        Some(tools) if !tools.is_empty() => {
            let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
            info!(count = tools.len(), tools = %names.join(", "), "Tools available");
            for tool in tools {
                debug!(tool = %tool.name, description = %tool.description, "Tool definition");
            }
        }
        _ => info!("Tools: none"),
    }
}

pub(crate) fn log_response(response: &CompletionResponse) {
    match response.usage {
        Some(usage) => info!(
            finish_reason = %response.finish_reason,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "LLM API response"
        ),
        None => info!(finish_reason = %response.finish_reason, "LLM API response"),
    }

    match &response.content {
        Some(content) if !content.is_empty() => {
            info!(content = %preview(content, RESPONSE_PREVIEW_CHARS), "Response content");
            debug!(content = %content, "Full response content");
        }
        _ => info!("Response content: none"),
    }

    if response.tool_calls.is_empty() {
        info!("Tool calls: none");
        return;
    }

    info!(count = response.tool_calls.len(), "Tool calls");
    for (index, call) in response.tool_calls.iter().enumerate() {
        info!(index, tool = %call.name, "Tool call");
        debug!(
            index,
            id = %call.id,
            arguments = %serde_json::Value::Object(call.arguments.clone()),
            "Tool call arguments"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayclaw_core::message::{ContentPart, ImageUrl, MessageContent, MessageToolCall};

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 4), "héll...");
        assert_eq!(preview(&"x".repeat(250), RESPONSE_PREVIEW_CHARS).len(), 203);
    }

    #[test]
    fn multipart_preview_flags_images() {
        let msg = Message::user(MessageContent::Parts(vec![
            ContentPart::Text { text: "what is this?".into() },
            ContentPart::ImageUrl { image_url: ImageUrl { url: "data:...".into() } },
        ]));
        assert_eq!(message_preview(&msg), "what is this? [+images]");
    }

    #[test]
    fn tool_call_turn_lists_names() {
        let msg = Message::assistant_tool_calls(vec![
            MessageToolCall { id: "1".into(), name: "search".into(), arguments: "{}".into() },
            MessageToolCall { id: "2".into(), name: "calc".into(), arguments: "{}".into() },
        ]);
        assert_eq!(message_preview(&msg), "[tool_calls: search, calc]");
    }

    #[test]
    fn empty_turn() {
        assert_eq!(message_preview(&Message::assistant("")), "[no content]");
    }

    #[test]
    fn long_message_is_cut_at_limit() {
        let msg = Message::user("a".repeat(500));
        assert_eq!(message_preview(&msg), format!("{}...", "a".repeat(MESSAGE_PREVIEW_CHARS)));
    }
}

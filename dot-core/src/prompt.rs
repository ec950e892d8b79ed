//! Prompt assembly. Pure functions, no I/O.

use crate::profile::DataProfile;
use crate::types::{ConversationMessage, DotData};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Build the system instructions for the backend.
///
/// Field descriptions are listed one per line; the block is left out when
/// there are none.
pub fn build_system_prompt<I, S>(app_description: &str, descriptions: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = descriptions
        .into_iter()
        .map(|d| d.as_ref().to_string())
        .collect();
    let desc_section = if lines.is_empty() {
        String::new()
    } else {
        format!("\n\nData field descriptions:\n{}", lines.join("\n"))
    };

    format!(
        "You are an AI dashboard generator for: {app_description}.{desc_section}\n\n\
         Generate a dashboard spec as valid JSON conforming to the schema.\n\
         Output ONLY valid JSON. No markdown, no explanation.\n\
         All widgets must use only the allowed types: kpi, table, bar, line, markdown."
    )
}

/// Build the user payload: the profile when the data was dropped for size,
/// otherwise the data itself.
pub fn build_user_prompt(data: &DotData, data_profile: Option<&DataProfile>) -> String {
    match data_profile {
        Some(profile) if data.is_empty() => format!(
            "Data profile (data was too large, using summary):\n{}\n\n\
             Generate a dashboard based on this data profile.",
            pretty(profile)
        ),
        _ => format!(
            "Current visible data:\n{}\n\nGenerate a dashboard spec as JSON.",
            pretty(data)
        ),
    }
}

/// Full message sequence: system first, history in order, user payload last.
pub fn build_messages<I, S>(
    app_description: &str,
    descriptions: I,
    data: &DotData,
    data_profile: Option<&DataProfile>,
    history: &[ConversationMessage],
) -> Vec<ConversationMessage>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ConversationMessage::system(build_system_prompt(
        app_description,
        descriptions,
    )));
    messages.extend(history.iter().cloned());
    messages.push(ConversationMessage::user(build_user_prompt(
        data,
        data_profile,
    )));
    messages
}

/// Hex SHA-256 over a message sequence, for correlating prompts in logs.
pub fn conversation_fingerprint(messages: &[ConversationMessage]) -> String {
    let mut hasher = Sha256::new();
    for msg in messages {
        hasher.update(msg.role.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(msg.content.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile;
    use crate::types::Role;
    use serde_json::json;

    fn data(value: serde_json::Value) -> DotData {
        value.as_object().cloned().expect("test data must be an object")
    }

    #[test]
    fn test_system_prompt_without_descriptions() {
        let prompt = build_system_prompt("Sales app", Vec::<String>::new());
        assert!(prompt.starts_with("You are an AI dashboard generator for: Sales app."));
        assert!(!prompt.contains("Data field descriptions"));
        assert!(prompt.contains("Output ONLY valid JSON."));
    }

    #[test]
    fn test_system_prompt_lists_descriptions() {
        let prompt = build_system_prompt("Sales app", ["orders: recent orders", "region: sales region"]);
        assert!(prompt.contains(
            "Data field descriptions:\norders: recent orders\nregion: sales region\n\n"
        ));
    }

    #[test]
    fn test_user_prompt_uses_data() {
        let d = data(json!({"total": 3}));
        let prompt = build_user_prompt(&d, None);
        assert!(prompt.starts_with("Current visible data:\n{\n  \"total\": 3\n}"));
    }

    #[test]
    fn test_user_prompt_uses_profile_only_when_data_dropped() {
        let d = data(json!({"rows": [1, 2, 3]}));
        let p = profile(&d, true);

        let summary = build_user_prompt(&DotData::new(), Some(&p));
        assert!(summary.starts_with("Data profile (data was too large, using summary):"));
        assert!(summary.contains("\"rowCount\": 3"));

        // Sampled but still within budget: the data itself is sent
        let full = build_user_prompt(&d, Some(&p));
        assert!(full.starts_with("Current visible data:"));
    }

    #[test]
    fn test_message_order() {
        let history = vec![
            ConversationMessage::user("show revenue"),
            ConversationMessage::assistant("Dashboard generated: Revenue"),
            ConversationMessage::user("now by region"),
        ];
        let messages = build_messages("App", ["d"], &DotData::new(), None, &history);
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(&messages[1..4], &history[..]);
        assert_eq!(messages[4].role, Role::User);
        assert!(messages[4].content.starts_with("Current visible data:"));
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let a = vec![ConversationMessage::user("x")];
        let b = vec![ConversationMessage::assistant("x")];
        assert_eq!(conversation_fingerprint(&a), conversation_fingerprint(&a));
        assert_ne!(conversation_fingerprint(&a), conversation_fingerprint(&b));
        assert_eq!(conversation_fingerprint(&a).len(), 64);
    }
}

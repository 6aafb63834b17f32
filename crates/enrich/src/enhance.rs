//! Prompt enhancer — inject retrieved context ahead of the final user turn.
//!
//! Insertion, never replacement: the synthesized system message goes
//! immediately before the last user message, which stays the last element
//! it was. The input sequence is never mutated.

use candor_core::message::{Message, Role};

/// Produce the message list to send to the generation model.
///
/// With no context this is the identity. With context, the original
/// sequence is returned with one synthesized system message inserted before
/// the last user message (scanning from the end). No user message → no-op.
pub fn enhance(messages: &[Message], context: Option<&str>) -> Vec<Message> {
    let Some(context) = context else {
        return messages.to_vec();
    };

    let Some(last_user) = messages.iter().rposition(|m| m.role == Role::User) else {
        return messages.to_vec();
    };

    let mut enhanced = Vec::with_capacity(messages.len() + 1);
    enhanced.extend_from_slice(&messages[..last_user]);
    enhanced.push(Message::system(context_note(context)));
    enhanced.extend_from_slice(&messages[last_user..]);
    enhanced
}

fn context_note(context: &str) -> String {
    format!(
        "Freshly retrieved context that may be relevant to the user's next \
         message. Use it only where it actually applies, and do not mention \
         this note:\n\n{context}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<Message> {
        vec![
            Message::system("Be direct."),
            Message::user("Earlier question"),
            Message::assistant("Earlier answer"),
            Message::user("What's the latest news today?"),
        ]
    }

    #[test]
    fn absent_context_is_identity() {
        let messages = conversation();
        let out = enhance(&messages, None);
        // Same content and order as the input sequence.
        assert_eq!(out, messages);
    }

    #[test]
    fn context_inserted_before_last_user_message() {
        let messages = conversation();
        let out = enhance(&messages, Some("Headline: things happened."));

        assert_eq!(out.len(), messages.len() + 1);
        assert_eq!(out[3].role, Role::System);
        assert!(out[3].content.contains("Headline: things happened."));
        // The final user message is untouched and still last.
        assert_eq!(out.last(), messages.last());
    }

    #[test]
    fn input_is_not_mutated() {
        let messages = conversation();
        let before = messages.clone();
        let _ = enhance(&messages, Some("ctx"));
        assert_eq!(messages, before);
    }

    #[test]
    fn user_message_mid_sequence_found_from_end() {
        let messages = vec![
            Message::user("only user turn"),
            Message::assistant("answer"),
        ];
        let out = enhance(&messages, Some("ctx"));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].role, Role::System);
        assert_eq!(out[1].content, "only user turn");
        assert_eq!(out[2].content, "answer");
    }

    #[test]
    fn no_user_message_is_noop() {
        let messages = vec![Message::system("sys"), Message::assistant("a")];
        let out = enhance(&messages, Some("ctx"));
        assert_eq!(out, messages);
    }

    #[test]
    fn empty_sequence_is_noop() {
        assert!(enhance(&[], Some("ctx")).is_empty());
    }
}

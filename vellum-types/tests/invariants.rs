//! Property-based invariant tests.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use vellum_types::{ContentBlock, ConversationMessage, MessageContent, Role, ToolParameter, ToolResult};

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::User),
        Just(Role::Assistant),
        Just(Role::System),
        Just(Role::Tool),
    ]
}

proptest! {
    /// Messages constructed with strictly increasing `created_at` sort back
    /// into insertion order under the `(created_at, id)` key the crate's own
    /// doc comment names as the conversation's total order.
    #[test]
    fn increasing_timestamps_sort_in_insertion_order(count in 1usize..30, role in arb_role()) {
        let base = Utc::now();
        let messages: Vec<ConversationMessage> = (0..count)
            .map(|i| ConversationMessage::with_timestamp(
                "conv",
                role,
                format!("message {i}"),
                base + Duration::milliseconds(i as i64),
            ))
            .collect();
        let mut sorted = messages.clone();
        sorted.sort_by_key(|m| (m.created_at, m.id.clone()));
        for (original, sorted) in messages.iter().zip(sorted.iter()) {
            prop_assert_eq!(&original.id, &sorted.id);
        }
    }

    /// `ToolResult::ok`/`ToolResult::err` never violate the "error present
    /// iff success is false" invariant documented on the type.
    #[test]
    fn tool_result_error_presence_matches_success(output in ".*", error in ".*") {
        let ok = ToolResult::ok(output);
        prop_assert!(ok.success);
        prop_assert!(ok.error.is_none());

        let failed = ToolResult::err(error);
        prop_assert!(!failed.success);
        prop_assert!(failed.error.is_some());
    }

    /// A plain-string `MessageContent` round-trips through `blocks()` as a
    /// single text block, and `as_joined_text()` recovers the original text.
    #[test]
    fn text_message_content_blocks_and_joined_text_agree(text in ".*") {
        let content = MessageContent::Text(text.clone());
        let blocks = content.blocks();
        prop_assert_eq!(blocks.len(), 1);
        prop_assert_eq!(blocks[0].as_text(), Some(text.as_str()));
        prop_assert_eq!(content.as_joined_text(), text);
    }

    /// `ContentBlock::text` always round-trips through `as_text`.
    #[test]
    fn content_block_text_roundtrips(text in ".*") {
        let block = ContentBlock::text(text.clone());
        prop_assert_eq!(block.as_text(), Some(text.as_str()));
    }

    /// `with_enum` attaches exactly the values given, in order.
    #[test]
    fn tool_parameter_with_enum_preserves_values(values in proptest::collection::vec(".*", 0..8)) {
        let param = ToolParameter::required_string("name", "desc").with_enum(values.clone());
        prop_assert_eq!(param.enum_values, Some(values));
    }
}

#[test]
fn clip_archive_detection_requires_system_role_and_prefix() {
    let system_clip = ConversationMessage::new(
        "conv",
        Role::System,
        format!("{}some summary", vellum_types::CLIP_ARCHIVE_PREFIX),
    );
    assert!(system_clip.is_clip_archive());

    let system_other = ConversationMessage::new("conv", Role::System, "unrelated system note");
    assert!(!system_other.is_clip_archive());

    let user_with_prefix = ConversationMessage::new(
        "conv",
        Role::User,
        format!("{}spoofed", vellum_types::CLIP_ARCHIVE_PREFIX),
    );
    assert!(!user_with_prefix.is_clip_archive());
}

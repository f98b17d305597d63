//! Summary batches: the archival artifact produced by compaction.

use chrono::{DateTime, SecondsFormat, Utc};

/// Prefix of every archival memory block label the compactor writes.
pub const BATCH_LABEL_PREFIX: &str = "compaction-batch-";

/// An archival summary, at some generation `depth`.
///
/// `depth` is 0 for a first-pass (fold-in) summary, `N+1` when produced by
/// re-summarizing batches whose maximum depth was `N`.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryBatch {
    /// The summary text (body only, without the reconstructible header).
    pub content: String,
    /// Generation depth.
    pub depth: usize,
    /// Start of the wall-clock range this batch's source messages/batches span.
    pub start_time: DateTime<Utc>,
    /// End of that range.
    pub end_time: DateTime<Utc>,
    /// Original message count this batch represents, summed transitively
    /// through re-summarization.
    pub message_count: usize,
}

impl SummaryBatch {
    /// The memory-block label this batch is archived under.
    #[must_use]
    pub fn label(&self, conversation_id: &str) -> String {
        label_for(conversation_id, self.end_time)
    }

    /// Render as `[depth:N|start:ISO|end:ISO|count:M]\n<content>`, the
    /// reconstructible form written to the archival memory block.
    #[must_use]
    pub fn to_archival_content(&self) -> String {
        format!(
            "[depth:{}|start:{}|end:{}|count:{}]\n{}",
            self.depth,
            self.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.message_count,
            self.content
        )
    }

    /// Parse a batch back out of archival memory-block content written by
    /// [`SummaryBatch::to_archival_content`]. Returns `None` if the header is
    /// malformed.
    #[must_use]
    pub fn parse_archival_content(content: &str) -> Option<Self> {
        let (header, body) = content.split_once('\n').unwrap_or((content, ""));
        let header = header.strip_prefix('[')?.strip_suffix(']')?;

        let mut depth = None;
        let mut start_time = None;
        let mut end_time = None;
        let mut message_count = None;

        for field in header.split('|') {
            let (key, value) = field.split_once(':')?;
            match key {
                "depth" => depth = value.parse().ok(),
                "start" => start_time = DateTime::parse_from_rfc3339(value).ok().map(|d| d.with_timezone(&Utc)),
                "end" => end_time = DateTime::parse_from_rfc3339(value).ok().map(|d| d.with_timezone(&Utc)),
                "count" => message_count = value.parse().ok(),
                _ => {}
            }
        }

        Some(SummaryBatch {
            content: body.to_string(),
            depth: depth?,
            start_time: start_time?,
            end_time: end_time?,
            message_count: message_count?,
        })
    }
}

/// The archival memory-block label for a batch ending at `end_time`.
#[must_use]
pub fn label_for(conversation_id: &str, end_time: DateTime<Utc>) -> String {
    format!(
        "{BATCH_LABEL_PREFIX}{conversation_id}-{}",
        end_time.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn roundtrips_through_archival_content() {
        let batch = SummaryBatch {
            content: "Summary 1".to_string(),
            depth: 0,
            start_time: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
            message_count: 7,
        };
        let rendered = batch.to_archival_content();
        let parsed = SummaryBatch::parse_archival_content(&rendered).unwrap();
        assert_eq!(parsed, batch);
    }

    #[test]
    fn label_matches_conversation_and_end_time() {
        let end = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let label = label_for("conv-1", end);
        assert!(label.starts_with("compaction-batch-conv-1-"));
    }
}

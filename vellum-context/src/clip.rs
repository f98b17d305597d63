//! Step 6 of the compaction pipeline: render the clip-archive message.

use crate::batch::SummaryBatch;

/// Render the clip-archive body for the full, end-time-ordered batch set.
///
/// `messages_compressed` is the count folded away by *this* call (not the
/// cumulative total); `batches` is the combined, chronologically ordered set
/// of every surviving batch after this call (existing + newly produced).
///
/// When `batches.len() <= clip_first + clip_last`, every batch is shown and
/// no omission marker is emitted. Otherwise exactly the first `clip_first`
/// and last `clip_last` are shown, with an omission marker between them.
#[must_use]
pub fn build_clip_archive(batches: &[SummaryBatch], messages_compressed: usize, clip_first: usize, clip_last: usize) -> String {
    let total = batches.len();
    let cycles = batches.iter().map(|b| b.depth).max().map_or(0, |d| d + 1);

    let mut out = format!(
        "{} {} messages compressed across {} compaction cycles]\n\n",
        vellum_types::CLIP_ARCHIVE_PREFIX,
        messages_compressed,
        cycles
    );

    let (earliest, omitted, recent) = if total <= clip_first + clip_last {
        let first_count = clip_first.min(total);
        (&batches[..first_count], 0usize, &batches[first_count..])
    } else {
        (&batches[..clip_first], total - clip_first - clip_last, &batches[total - clip_last..])
    };

    out.push_str("## Earliest context\n");
    for (i, batch) in earliest.iter().enumerate() {
        out.push_str(&render_batch(i + 1, batch));
    }

    if omitted > 0 {
        out.push_str(&format!(
            "\n[... {omitted} earlier summaries omitted, searchable via memory_read ...]\n\n"
        ));
    }

    out.push_str("## Recent context\n");
    let recent_start_index = total - recent.len() + 1;
    for (i, batch) in recent.iter().enumerate() {
        out.push_str(&render_batch(recent_start_index + i, batch));
    }

    out
}

fn render_batch(index: usize, batch: &SummaryBatch) -> String {
    use chrono::SecondsFormat;
    format!(
        "[Batch {index} — depth {}, {} to {}]\n{}\n\n",
        batch.depth,
        batch.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        batch.end_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        batch.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn batch(n: i64, content: &str) -> SummaryBatch {
        SummaryBatch {
            content: content.to_string(),
            depth: 0,
            start_time: Utc.with_ymd_and_hms(2026, 1, n, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 1, n, 1, 0, 0).unwrap(),
            message_count: 10,
        }
    }

    #[test]
    fn shows_every_batch_when_within_clip_window() {
        let batches = vec![batch(1, "a"), batch(2, "b")];
        let archive = build_clip_archive(&batches, 20, 2, 2);
        assert!(archive.contains('a'));
        assert!(archive.contains('b'));
        assert!(!archive.contains("omitted"));
    }

    #[test]
    fn omits_middle_band_with_correct_count() {
        let batches: Vec<_> = (1..=6).map(|n| batch(n, &format!("s{n}"))).collect();
        let archive = build_clip_archive(&batches, 20, 2, 2);
        assert!(archive.contains("s1"));
        assert!(archive.contains("s2"));
        assert!(archive.contains("s5"));
        assert!(archive.contains("s6"));
        assert!(!archive.contains("s3"));
        assert!(!archive.contains("s4"));
        assert!(archive.contains("[... 2 earlier summaries omitted, searchable via memory_read ...]"));
    }

    #[test]
    fn header_starts_with_clip_archive_prefix() {
        let batches = vec![batch(1, "a")];
        let archive = build_clip_archive(&batches, 5, 2, 2);
        assert!(archive.starts_with(vellum_types::CLIP_ARCHIVE_PREFIX));
    }
}

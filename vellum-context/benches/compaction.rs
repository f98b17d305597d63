use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vellum_context::TokenCounter;
use vellum_types::{ConversationMessage, Role};

fn make_conversation(n: usize) -> Vec<ConversationMessage> {
    (0..n)
        .map(|i| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            ConversationMessage::new(
                "bench-conversation",
                role,
                format!(
                    "Message {i}: this is a moderately sized message with enough content \
                     to be realistic for token counting benchmarks."
                ),
            )
        })
        .collect()
}

fn bench_token_counting(c: &mut Criterion) {
    let counter = TokenCounter::new();
    let mut group = c.benchmark_group("token_count");
    for n in [100, 1_000, 10_000] {
        let messages = make_conversation(n);
        group.bench_function(format!("{n}_messages"), |b| {
            b.iter(|| counter.estimate_messages(black_box(&messages)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_token_counting);
criterion_main!(benches);

/// 正規化と採点パイプラインの性能ベンチマーク。
use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use respect_guard::{
    artifacts::{ArtifactPaths, ModelArtifacts},
    classification::{ToxicityScorer, Verdict, clean},
};

const COMMENTS: &[&str] = &[
    "You are so STUPID!!! visit www.spam.com",
    "Thank you for sharing, great work! https://example.com/post?id=42",
    "shut up you dumb loser, nobody wants to read this trash",
    "What a kind thing to say, thank you 😀😀😀",
];

fn synthetic_comments(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| COMMENTS[i % COMMENTS.len()].repeat(1 + i % 4))
        .collect()
}

fn fixture_scorer() -> ToxicityScorer {
    let paths = ArtifactPaths::in_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"));
    let artifacts = ModelArtifacts::load(&paths).expect("fixture artifacts load");
    ToxicityScorer::new(Arc::new(artifacts))
}

fn bench_clean(c: &mut Criterion) {
    let comments = synthetic_comments(1024);
    c.bench_function("clean_comments_1k", |b| {
        b.iter(|| {
            let total: usize = comments.iter().map(|comment| clean(comment.as_str()).len()).sum();
            black_box(total);
        });
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let scorer = fixture_scorer();
    let comments = synthetic_comments(1024);
    c.bench_function("evaluate_comments_1k", |b| {
        b.iter(|| {
            let blocked = comments
                .iter()
                .filter(|comment| scorer.evaluate(comment).verdict == Verdict::Blocked)
                .count();
            black_box(blocked);
        });
    });
}

criterion_group!(benches, bench_clean, bench_evaluate);
criterion_main!(benches);

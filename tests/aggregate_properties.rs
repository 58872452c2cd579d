// tests/aggregate_properties.rs
//
// Seeded randomized checks of the aggregator contract plus the worked
// scenarios from the docs, through the public crate surface only.

use rand::{rngs::StdRng, Rng, SeedableRng};

use video_comment_sentiment::{
    aggregate, extract_video_id, ClassificationResult, InvalidInputError, Label, Sentiment,
};

fn random_batch(rng: &mut StdRng, n: usize) -> (Vec<String>, Vec<ClassificationResult>) {
    let comments = (0..n).map(|i| format!("comment #{i}")).collect();
    let results = (0..n)
        .map(|_| {
            let label = if rng.random_bool(0.5) {
                Label::Positive
            } else {
                Label::Negative
            };
            // two decimals keeps band edges (0.4 / 0.7) reachable
            let score = f64::from(rng.random_range(0..=100u32)) / 100.0;
            ClassificationResult::new(label, score).expect("score in range")
        })
        .collect();
    (comments, results)
}

/// Reference two-decimal rounding on the full decimal expansion of a
/// non-negative `x`, ties to even.
fn decimal_round2(x: f64) -> f64 {
    // 1100 places is more than any f64 needs, so the expansion is exact.
    let exact = format!("{x:.1100}");
    let (int_part, frac) = exact.split_once('.').expect("fraction digits");
    let mut cents: u64 = format!("{int_part}{}", &frac[..2]).parse().expect("digits");
    let rest = frac[2..].trim_end_matches('0');
    let round_up = match rest.cmp("5") {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => cents % 2 == 1,
    };
    if round_up {
        cents += 1;
    }
    cents as f64 / 100.0
}

#[test]
fn reference_rounding_is_decimal_not_scaled() {
    assert_eq!(decimal_round2(0.695), 0.69);
    assert_eq!(decimal_round2(0.125), 0.12);
    assert_eq!(decimal_round2(0.875), 0.88);
    assert_eq!(decimal_round2(0.52), 0.52);
}

#[test]
fn fails_iff_lengths_differ_or_empty() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let n = rng.random_range(0..8usize);
        let m = rng.random_range(0..8usize);
        let (comments, _) = random_batch(&mut rng, n);
        let (_, results) = random_batch(&mut rng, m);

        let out = aggregate(&comments, &results);
        if n != m || n == 0 {
            assert!(out.is_err(), "n={n} m={m} must fail");
        } else {
            assert!(out.is_ok(), "n={n} must succeed");
        }
    }
}

#[test]
fn buckets_are_bounded_sorted_and_drawn_from_input() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let n = rng.random_range(1..40usize);
        let (comments, results) = random_batch(&mut rng, n);
        let v = aggregate(&comments, &results).unwrap();

        let neutral_in = results
            .iter()
            .filter(|r| r.score() > 0.4 && r.score() < 0.7)
            .count();
        let positive_in = results
            .iter()
            .filter(|r| !(r.score() > 0.4 && r.score() < 0.7) && r.label() == Label::Positive)
            .count();
        let negative_in = n - neutral_in - positive_in;

        assert_eq!(v.positive.len(), positive_in.min(5));
        assert_eq!(v.negative.len(), negative_in.min(5));
        assert_eq!(v.neutral.len(), neutral_in.min(5));

        for w in v.positive.windows(2).chain(v.negative.windows(2)) {
            assert!(w[0].score >= w[1].score);
        }
        for w in v.neutral.windows(2) {
            assert!(w[0].score <= w[1].score);
        }
        for sc in v.positive.iter().chain(&v.negative).chain(&v.neutral) {
            let idx = comments
                .iter()
                .position(|c| c == &sc.comment)
                .expect("output comment comes from input");
            assert_eq!(results[idx].score(), sc.score);
        }
    }
}

#[test]
fn overall_score_is_rounded_mean_positivity() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..200 {
        let n = rng.random_range(1..25usize);
        let (comments, results) = random_batch(&mut rng, n);
        let v = aggregate(&comments, &results).unwrap();

        let mean = results.iter().map(|r| r.positivity()).sum::<f64>() / n as f64;
        assert_eq!(v.overall_score, decimal_round2(mean), "mean = {mean:?}");
        assert!((0.0..=1.0).contains(&v.overall_score));

        let s = v.overall_score;
        let expected = if s > 0.4 && s < 0.7 {
            Sentiment::Neutral
        } else if s > 0.7 {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        };
        assert_eq!(v.overall_sentiment, expected);
    }
}

#[test]
fn scenario_mixed_three_comments() {
    let comments = ["great!", "terrible", "meh"];
    let results = [
        ClassificationResult::new(Label::Positive, 0.95).unwrap(),
        ClassificationResult::new(Label::Negative, 0.9).unwrap(),
        ClassificationResult::new(Label::Positive, 0.5).unwrap(),
    ];
    let v = aggregate(&comments, &results).unwrap();
    assert_eq!(v.positive.len(), 1);
    assert_eq!(v.positive[0].comment, "great!");
    assert_eq!(v.positive[0].score, 0.95);
    assert_eq!(v.negative[0].comment, "terrible");
    assert_eq!(v.negative[0].score, 0.9);
    assert_eq!(v.neutral[0].comment, "meh");
    assert_eq!(v.overall_score, 0.52);
    assert_eq!(v.overall_sentiment, Sentiment::Neutral);
}

#[test]
fn scenario_single_comments_and_empty() {
    let pos = aggregate(
        &["yes"],
        &[ClassificationResult::new(Label::Positive, 0.99).unwrap()],
    )
    .unwrap();
    assert_eq!(pos.overall_score, 0.99);
    assert_eq!(pos.overall_sentiment, Sentiment::Positive);

    let neg = aggregate(
        &["no"],
        &[ClassificationResult::new(Label::Negative, 0.99).unwrap()],
    )
    .unwrap();
    assert_eq!(neg.overall_score, 0.01);
    assert_eq!(neg.overall_sentiment, Sentiment::Negative);

    let empty: Vec<String> = Vec::new();
    assert_eq!(aggregate(&empty, &[]), Err(InvalidInputError::Empty));
}

#[test]
fn video_id_examples() {
    assert_eq!(
        extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
        Ok("dQw4w9WgXcQ")
    );
    assert_eq!(
        extract_video_id("https://x.com/watch?v=dQw4w9WgXcQ"),
        Ok("dQw4w9WgXcQ")
    );
    assert!(extract_video_id("not a url").is_err());
}

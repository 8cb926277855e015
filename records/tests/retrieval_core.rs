//! Integration tests for the retrieval core.
//!
//! These exercise the contracts the query engine leans on: layered
//! scoring dominance, dispatch precedence, merge algebra, and the
//! context budget, exercised across module boundaries rather than per unit.

use prmail_records::{
    ContextBuilder, NotificationExtractor, ParsedQuery, QueryMode, RawNotification, Record,
    RuleTagClassifier, ScoringEngine, merge,
};

fn extract(subject: &str, body: &str) -> Record {
    NotificationExtractor::with_defaults()
        .extract(&RawNotification::new(subject, body))
        .unwrap()
}

#[test]
fn test_layered_dominance_survives_extraction() {
    // The record actually about PR 1234 has nothing else going for it.
    let target = extract("[acme/widgets] Small tweak (PR #1234)", "A tiny change.\n");

    // The decoy shares tags, title words, files, and a contributor with
    // the query, but is a different PR.
    let decoy = extract(
        "[acme/widgets] Fix login crash and optimize sql query (PR #9999)",
        "@login reviewed.\n\nFile Changes\nM src/login/crash.rs\nM db/sql/query.rs\n",
    );

    let mut query = ParsedQuery::parse("PR #1234 fix login crash optimize sql query");
    query.derive_tags(&RuleTagClassifier::new());

    let engine = ScoringEngine::new();
    let target_score = engine.score(&target, &query);
    let decoy_score = engine.score(&decoy, &query);

    assert_eq!(target_score.pr_number(), 1);
    assert!(decoy_score.pr_number() == 0);
    assert!(decoy_score.tags() > 0 || decoy_score.title() > 0);
    assert!(
        target_score > decoy_score,
        "a tier-1 match must outrank any pile of lower-tier matches"
    );
}

#[test]
fn test_dispatch_precedence_commit_over_pr() {
    let both = "does 3f2a9bc1d4e5f60718293a4b5c6d7e8f90a1b2c3 belong to PR #42?";
    assert!(matches!(
        QueryMode::detect(both),
        QueryMode::Commit { .. }
    ));

    let pr_only = "does PR #42 touch the parser?";
    assert_eq!(QueryMode::detect(pr_only), QueryMode::Pr { number: 42 });
}

#[test]
fn test_merge_is_commutative_on_set_fields() {
    let a = extract(
        "[acme/widgets] Fix session crash (PR #8040)",
        "Commit Summary\n- 3f2a9bc1d fix crash\n\nFile Changes\nM src/auth/session.rs\n",
    );
    let b = extract(
        "Re: [acme/widgets] Fix session crash (PR #8040)",
        "Commit Summary\n- 77eaab2 optimize cache\n\nFile Changes\nM src/auth/cache.rs\n",
    );

    let ab = merge::merge(Some(a.clone()), b.clone()).unwrap();
    let ba = merge::merge(Some(b), a).unwrap();

    assert_eq!(ab.tickets, ba.tickets);
    assert_eq!(ab.files, ba.files);
    assert_eq!(ab.tags, ba.tags);
    assert_eq!(ab.contributors, ba.contributors);

    // Order-sensitive fields follow input order instead.
    assert_eq!(ab.commits, vec!["3f2a9bc".to_string(), "77eaab2".to_string()]);
    assert_eq!(ba.commits, vec!["77eaab2".to_string(), "3f2a9bc".to_string()]);
}

#[test]
fn test_context_budget_holds_for_merged_records() {
    let a = extract(
        "[acme/widgets] Fix session crash (PR #8040)",
        &format!("Summary\n{}\n", "long body ".repeat(200)),
    );
    let b = extract(
        "[acme/db-tools] Add migration (PR #512)",
        &format!("Summary\n{}\n", "other body ".repeat(200)),
    );

    let corpus = merge::fold(vec![a, b]).unwrap();
    let records: Vec<&Record> = corpus.records().iter().collect();

    let builder = ContextBuilder::new();
    for budget in [0, 100, 500, 5000] {
        let context = builder.build(&records, budget);
        assert!(context.chars().count() <= budget);
    }
}

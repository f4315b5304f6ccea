//! Statistics aggregation over search results.

mod helpers;

use grepscope::{SearchEngine, SearchOptions, SymbolType};
use helpers::{FileSpec, TestIndex};
use std::sync::Arc;

fn stats_fixture() -> TestIndex {
    TestIndex::build(vec![
        FileSpec::new("src/sum.go", "func Sum() int {\n\treturn 1\n}\nvar x = Sum()\n")
            .block(grepscope::BlockKind::Function, "Sum", 0, 2)
            .symbol_span("Sum", SymbolType::Function, 1, 3),
        FileSpec::new("pkg/sum_test.go", "Sum()\n"),
        FileSpec::new("docs.go", "// Sum does things\n"),
        FileSpec::new("py/vals.py", "Summary = compute()\n")
            .symbol("Summary", SymbolType::Variable, 1),
    ])
}

#[test]
fn test_search_stats_distributions() {
    let engine = SearchEngine::new(Arc::new(stats_fixture()));
    let stats = engine.search_stats("Sum", &[], &SearchOptions::default());

    assert_eq!(stats.pattern, "Sum");
    assert_eq!(stats.total_matches, 5);
    assert_eq!(stats.files_with_matches, 4);
    assert_eq!(stats.file_distribution["src/sum.go"], 2);
    assert_eq!(stats.file_distribution["pkg/sum_test.go"], 1);
    assert_eq!(stats.dir_distribution["src"], 2);
    assert_eq!(stats.dir_distribution["."], 1, "top-level files land in the '.' bucket");

    assert_eq!(stats.test_file_matches, 1);
    assert_eq!(stats.comment_matches, 1, "only docs.go matched on a comment line");
}

#[test]
fn test_search_stats_symbol_breakdown() {
    let engine = SearchEngine::new(Arc::new(stats_fixture()));
    let stats = engine.search_stats("Sum", &[], &SearchOptions::default());

    // src/sum.go: both matched lines sit inside the Sum function span
    // (line 4 via the ten-line span guess); py/vals.py hits Summary
    assert_eq!(stats.symbol_types["function"], 2);
    assert_eq!(stats.symbol_types["variable"], 1);

    // Only `Summary = ...` starts with its symbol's name
    assert_eq!(stats.definition_count, 1);
    assert_eq!(stats.usage_count, 2);

    // Sum (x2) and Summary all start uppercase
    assert_eq!(stats.exported_symbols, 3);
}

#[test]
fn test_search_stats_hot_spots() {
    let engine = SearchEngine::new(Arc::new(stats_fixture()));
    let stats = engine.search_stats("Sum", &[], &SearchOptions::default());

    assert!(!stats.hot_spots.is_empty());
    let top = &stats.hot_spots[0];
    assert_eq!(top.path, "src/sum.go");
    assert_eq!(top.match_count, 2);
    assert_eq!(top.first_line, 1);
    assert_eq!(top.last_line, 4);
    assert!(stats.hot_spots.len() <= 5);
}

#[test]
fn test_search_stats_empty_query() {
    let engine = SearchEngine::new(Arc::new(stats_fixture()));
    let stats = engine.search_stats("", &[], &SearchOptions::default());
    assert_eq!(stats.total_matches, 0);
    assert_eq!(stats.files_with_matches, 0);
    assert!(stats.hot_spots.is_empty());
}

#[test]
fn test_multi_search_stats_common_files_and_cooccurrence() {
    let engine = SearchEngine::new(Arc::new(stats_fixture()));
    let patterns = vec!["Sum".to_string(), "return".to_string()];
    let multi = engine.multi_search_stats(&patterns, &[], &SearchOptions::default());

    assert_eq!(multi.patterns.len(), 2);
    assert_eq!(multi.common_files, vec!["src/sum.go".to_string()]);
    assert_eq!(multi.co_occurrence["Sum"]["return"], 1);
    assert_eq!(multi.co_occurrence["return"]["Sum"], 1);
}

#[test]
fn test_multi_search_stats_skips_empty_patterns() {
    let engine = SearchEngine::new(Arc::new(stats_fixture()));
    let patterns = vec!["Sum".to_string(), String::new()];
    let multi = engine.multi_search_stats(&patterns, &[], &SearchOptions::default());
    assert_eq!(multi.patterns.len(), 1);
    assert!(multi.co_occurrence.is_empty(), "a single pattern has no co-occurrence pairs");
}

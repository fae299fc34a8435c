//! Resolving evidence against decoded trees

use std::collections::HashMap;

use rstest::{fixture, rstest};

use proftree::domain::{
    Evaluator, EvidenceValue, KeyPolicy, MatchOptions, NoMatchReason, ProfileTree, TreeBuilder,
};
use proftree::util::testing;

fn tree(data: &str) -> ProfileTree {
    TreeBuilder::new()
        .build_from_str(&format!(r#"{{"Version": "1.0", "PublishDate": "2024-01-01", "Data": {data}}}"#))
        .unwrap()
}

fn evidence(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[fixture]
fn screen_tree() -> ProfileTree {
    testing::init_test_setup();
    tree(r#"[{"n": [1]}, {"m": "screenwidth", "r": [[300, 400]], "x": 42}]"#)
}

#[rstest]
#[case::inside("350", Some(42))]
#[case::lower_bound("300", Some(42))]
#[case::upper_bound("400", Some(42))]
#[case::outside("500", None)]
#[case::not_a_number("wide", None)]
fn given_screen_tree_when_resolving_width_then_range_decides(
    screen_tree: ProfileTree,
    #[case] width: &str,
    #[case] expected: Option<u32>,
) {
    let result = Evaluator::default().evaluate(&screen_tree, &evidence(&[("screenwidth", width)]));
    assert_eq!(result, expected);
}

#[rstest]
fn given_screen_tree_when_width_outside_range_then_reason_is_no_matching_branch(screen_tree: ProfileTree) {
    let resolution = Evaluator::default().resolve(&screen_tree, &evidence(&[("screenwidth", "500")]));

    assert_eq!(resolution.profile_id, None);
    assert_eq!(resolution.reason, Some(NoMatchReason::NoMatchingBranch));
    assert_eq!(resolution.path, vec![0]);
}

#[rstest]
#[case::lower_edge(10.1, true)]
#[case::upper_edge(20.2, true)]
#[case::just_below(10.09, false)]
#[case::just_above(20.21, false)]
fn given_fractional_range_when_numeric_evidence_then_bounds_are_inclusive(#[case] value: f64, #[case] hit: bool) {
    let t = tree(r#"[{"n": [1]}, {"m": "benchmarkaverage", "r": [10.1, 20.2], "x": 5}]"#);
    let ev = HashMap::from([("benchmarkaverage".to_string(), EvidenceValue::Number(value))]);

    assert_eq!(Evaluator::default().evaluate(&t, &ev).is_some(), hit);
}

#[rstest]
fn given_empty_evidence_when_resolving_then_no_match(screen_tree: ProfileTree) {
    let resolution = Evaluator::default().resolve(&screen_tree, &HashMap::<String, String>::new());

    assert_eq!(resolution.profile_id, None);
    assert_eq!(resolution.reason, Some(NoMatchReason::MissingEvidence));
}

#[rstest]
#[case::range_first(r#"[{"n": [1, 2]}, {"m": "k", "r": [0, 10], "x": 1}, {"m": "k", "v": "5", "x": 2}]"#, 1)]
#[case::value_first(r#"[{"n": [1, 2]}, {"m": "k", "v": "5", "x": 2}, {"m": "k", "r": [0, 10], "x": 1}]"#, 2)]
fn given_overlapping_siblings_when_resolving_then_first_declared_match_wins(#[case] data: &str, #[case] expected: u32) {
    let result = Evaluator::default().evaluate(&tree(data), &evidence(&[("k", "5")]));
    assert_eq!(result, Some(expected));
}

#[test]
fn given_nested_profiles_when_resolving_then_deepest_wins() {
    let t = tree(
        r#"[{"n": [1], "x": 1}, {"m": "a", "v": "x", "x": 2, "n": [2]}, {"m": "b", "v": "y", "n": [3]}, {"m": "c", "v": "z", "x": 4}]"#,
    );

    let shallow = Evaluator::default().resolve(&t, &evidence(&[("a", "x"), ("b", "y")]));
    assert_eq!(shallow.profile_id, Some(2));
    assert_eq!(shallow.path, vec![0, 1, 2]);

    let deep = Evaluator::default().resolve(&t, &evidence(&[("a", "x"), ("b", "y"), ("c", "z")]));
    assert_eq!(deep.profile_id, Some(4));
    assert_eq!(deep.path, vec![0, 1, 2, 3]);

    let root_only = Evaluator::default().resolve(&t, &evidence(&[("a", "nope")]));
    assert_eq!(root_only.profile_id, Some(1));
}

#[test]
fn given_path_without_profiles_when_resolving_then_reason_is_no_profile_on_path() {
    let t = tree(r#"[{"n": [1]}, {"m": "a", "v": "x"}]"#);

    let resolution = Evaluator::default().resolve(&t, &evidence(&[("a", "x")]));

    assert_eq!(resolution.profile_id, None);
    assert_eq!(resolution.reason, Some(NoMatchReason::NoProfileOnPath));
    assert_eq!(resolution.path, vec![0, 1]);
}

#[rstest]
#[case::inherit(KeyPolicy::Inherit, Some(3))]
#[case::explicit(KeyPolicy::Explicit, None)]
fn given_keyless_child_when_resolving_then_key_policy_decides(#[case] policy: KeyPolicy, #[case] expected: Option<u32>) {
    let t = tree(r#"[{"n": [1]}, {"m": "gpufamily", "v": "Mali", "n": [2]}, {"v": "Mali", "x": 3}]"#);
    let evaluator = Evaluator::new(MatchOptions {
        key_policy: policy,
        ..MatchOptions::default()
    });

    assert_eq!(evaluator.evaluate(&t, &evidence(&[("gpufamily", "Mali")])), expected);
}

#[rstest]
#[case::sensitive(true, None)]
#[case::insensitive(false, Some(9))]
fn given_literal_in_other_case_when_resolving_then_case_option_decides(#[case] case_sensitive: bool, #[case] expected: Option<u32>) {
    let t = tree(r#"[{"n": [1]}, {"m": "gpurenderer", "v": "Apple M1", "x": 9}]"#);
    let evaluator = Evaluator::new(MatchOptions {
        case_sensitive,
        ..MatchOptions::default()
    });

    assert_eq!(evaluator.evaluate(&t, &evidence(&[("gpurenderer", "APPLE m1")])), expected);
}

#[test]
fn given_fixture_when_resolving_end_to_end_then_expected_profiles() {
    let t = ProfileTree::from_reader(std::fs::File::open("tests/resources/trees/screen.json").unwrap()).unwrap();
    let evaluator = Evaluator::default();

    assert_eq!(evaluator.evaluate(&t, &evidence(&[("screenwidth", "350")])), Some(42));
    assert_eq!(evaluator.evaluate(&t, &evidence(&[("screenwidth", "350"), ("screenheight", "650")])), Some(43));
    assert_eq!(evaluator.evaluate(&t, &evidence(&[("screenwidth", "350"), ("hash3d", "abc")])), Some(44));
    assert_eq!(evaluator.evaluate(&t, &evidence(&[("screenwidth", "500")])), None);
    assert_eq!(evaluator.evaluate(&t, &evidence(&[("gpufamily", "PowerVR")])), Some(10));
}

#[rstest]
#[case::whole(5.0)]
#[case::fractional(2.5)]
fn given_numeric_literal_when_numeric_evidence_is_equal_then_matches(#[case] value: f64) {
    let t = tree(&format!(r#"[{{"n": [1]}}, {{"m": "k", "v": {value:?}, "x": 3}}]"#));
    let ev = HashMap::from([("k".to_string(), EvidenceValue::Number(value))]);

    assert_eq!(Evaluator::default().evaluate(&t, &ev), Some(3));
}

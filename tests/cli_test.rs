//! Command dispatch through the library entry point

use std::fs;

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

use proftree::cli::{execute_command, Cli};
use proftree::exitcode;

const TREE: &str = "tests/resources/trees/screen.json";

fn run(args: &[&str]) -> i32 {
    let cli = Cli::try_parse_from(std::iter::once("proftree").chain(args.iter().copied())).unwrap();
    match execute_command(&cli) {
        Ok(code) => code,
        Err(e) => e.exit_code(),
    }
}

#[rstest]
#[case::match_found(&["resolve", "-f", TREE, "-e", "screenwidth=350"], exitcode::OK)]
#[case::no_match(&["resolve", "-f", TREE, "-e", "screenwidth=500"], exitcode::NOMATCH)]
#[case::json_output(&["resolve", "-f", TREE, "-e", "screenwidth=350", "--json", "--trace"], exitcode::OK)]
#[case::evidence_file(&["resolve", "-f", TREE, "--evidence-json", "tests/resources/evidence/single.json"], exitcode::OK)]
#[case::bad_pair(&["resolve", "-f", TREE, "-e", "screenwidth"], exitcode::USAGE)]
#[case::batch(&["batch", "-f", TREE, "tests/resources/evidence/records.json"], exitcode::OK)]
#[case::info(&["info", "-f", TREE], exitcode::OK)]
#[case::show(&["show", "-f", TREE], exitcode::OK)]
#[case::validate_ok(&["validate", TREE], exitcode::OK)]
#[case::validate_cycle(&["validate", "tests/resources/trees/cyclic.json"], exitcode::DATAERR)]
#[case::missing_file(&["info", "-f", "tests/resources/trees/absent.json"], exitcode::NOINPUT)]
#[case::config_template(&["config", "template"], exitcode::OK)]
fn given_command_line_when_executed_then_exit_code_matches(#[case] args: &[&str], #[case] expected: i32) {
    assert_eq!(run(args), expected);
}

#[test]
fn given_config_with_data_file_when_resolving_without_data_then_uses_configured_tree() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("proftree.toml");
    let tree = std::env::current_dir().unwrap().join(TREE);
    fs::write(&config, format!("data_file = {:?}\n", tree.to_str().unwrap())).unwrap();

    let code = run(&["-c", config.to_str().unwrap(), "resolve", "-e", "screenwidth=350"]);

    assert_eq!(code, exitcode::OK);
}

#[test]
fn given_case_mismatch_when_ignore_case_flag_then_literal_matches() {
    assert_eq!(run(&["resolve", "-f", TREE, "-e", "gpufamily=powervr"]), exitcode::NOMATCH);
    assert_eq!(run(&["resolve", "-f", TREE, "-e", "gpufamily=powervr", "--ignore-case"]), exitcode::OK);
}

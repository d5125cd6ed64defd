use super::*;
use crate::config::{CandidateOrder, CompletionConfig, OptionCompletion, SubcommandPolicy};
use crate::error::CompleterError;
use crate::spec::{Action, Arity, CommandSpec, ValueHint};

fn sample_spec() -> CommandSpec {
    CommandSpec::new("myprog")
        .action(Action::flag(["-v", "--verbose"]).repeatable(true).help("More output"))
        .action(Action::flag(["--quiet"]))
        .action(
            Action::flag(["-p", "--protocol"])
                .arity(Arity::One)
                .choices(["http", "https", "ssh"]),
        )
        .action(Action::flag(["--debug-dump"]).hidden(true))
        .action(
            Action::flag(["--branch"])
                .arity(Arity::One)
                .completer(completer_fn("branches", |_req| {
                    Err(CompleterError::failed("branches", "not a git repository"))
                })),
        )
        .action(
            Action::flag(["--color"])
                .arity(Arity::One)
                .choices(["never"])
                .completer(completer_fn("colors", |_req| {
                    Ok(vec!["auto".into(), "always".into(), "auto".into()])
                })),
        )
        .action(
            Action::flag(["--file"])
                .arity(Arity::One)
                .choices(["my file.txt", "other.txt", "docs/"]),
        )
        .action(Action::flag(["--note"]).arity(Arity::One).value_hint(ValueHint::Nothing))
        .subcommand(CommandSpec::new("push").help("Upload changes"))
        .subcommand(CommandSpec::new("status").alias("st"))
}

fn complete(spec: &CommandSpec, line: &str) -> CompletionOutcome {
    CompletionEngine::new(CompletionConfig::default()).complete_line(spec, line, line.len())
}

#[test]
fn test_flag_prefix_single_match() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --prot");
    assert_eq!(outcome.values(), vec!["--protocol"]);
    assert!(outcome.candidates[0].finished);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_choices_filtered_by_prefix() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --protocol h");
    assert_eq!(outcome.values(), vec!["http", "https"]);
    assert!(outcome.candidates.iter().all(|c| !c.finished));
}

#[test]
fn test_subcommand_prefix() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog pu");
    assert_eq!(outcome.values(), vec!["push"]);
    assert_eq!(outcome.candidates[0].description.as_deref(), Some("Upload changes"));
}

#[test]
fn test_subcommand_aliases_offered() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog s");
    assert_eq!(outcome.values(), vec!["status", "st"]);
}

#[test]
fn test_all_flags_in_declaration_order() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --");
    assert_eq!(
        outcome.values(),
        vec![
            "--verbose",
            "--quiet",
            "--protocol",
            "--branch",
            "--color",
            "--file",
            "--note"
        ]
    );
}

#[test]
fn test_satisfied_flags_not_reoffered() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --quiet -v --");
    assert!(!outcome.values().contains(&"--quiet"));
    assert!(outcome.values().contains(&"--verbose"));
}

#[test]
fn test_hidden_flags() {
    let spec = sample_spec();
    assert!(complete(&spec, "myprog --debug").values().is_empty());

    let config = CompletionConfig {
        print_hidden: true,
        ..CompletionConfig::default()
    };
    let line = "myprog --debug";
    let outcome = CompletionEngine::new(config).complete_line(&spec, line, line.len());
    assert_eq!(outcome.values(), vec!["--debug-dump"]);
}

#[test]
fn test_excluded_flags() {
    let spec = sample_spec();
    let config = CompletionConfig {
        exclude: vec!["--quiet".to_string()],
        ..CompletionConfig::default()
    };
    let line = "myprog --q";
    let outcome = CompletionEngine::new(config).complete_line(&spec, line, line.len());
    assert!(outcome.values().is_empty());
}

#[test]
fn test_failing_completer_becomes_warning() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --branch ");
    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("not a git repository"));
}

#[test]
fn test_panicking_completer_becomes_warning() {
    let spec = CommandSpec::new("prog").action(
        Action::flag(["--id"])
            .arity(Arity::One)
            .completer(completer_fn("ids", |_req| panic!("lookup exploded"))),
    );
    let outcome = complete(&spec, "prog --id ");
    assert!(outcome.candidates.is_empty());
    assert!(outcome.warnings[0].contains("lookup exploded"));
}

#[test]
fn test_completer_preferred_over_choices_and_deduped() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --color a");
    assert_eq!(outcome.values(), vec!["auto", "always"]);
}

#[test]
fn test_inline_assignment_reprefixed() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --protocol=ht");
    assert_eq!(outcome.values(), vec!["--protocol=http", "--protocol=https"]);
    assert_eq!(outcome.word_prefix, "--protocol=ht");
}

#[test]
fn test_unterminated_quote() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --file 'my f");
    assert_eq!(outcome.values(), vec!["my file.txt"]);
    assert_eq!(outcome.quote, QuoteKind::Single);
    assert!(outcome.candidates[0].finished);
}

#[test]
fn test_continuation_candidate_not_finished() {
    let spec = sample_spec();
    let outcome = complete(&spec, "myprog --file do");
    assert_eq!(outcome.values(), vec!["docs/"]);
    assert!(!outcome.candidates[0].finished);
}

#[test]
fn test_value_hint_nothing() {
    let spec = sample_spec();
    assert!(complete(&spec, "myprog --note ").candidates.is_empty());
}

#[test]
fn test_positional_with_files_completer() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.md"), "").unwrap();
    let spec = CommandSpec::new("prog").action(
        Action::positional("input").completer(FilesCompleter::new().base_dir(dir.path())),
    );
    let outcome = complete(&spec, "prog no");
    assert_eq!(outcome.values(), vec!["notes.md"]);
    assert_eq!(outcome.candidates[0].kind, CandidateKind::File);
}

#[test]
fn test_subcommands_unioned_with_positional_values() {
    let spec = CommandSpec::new("tool")
        .action(Action::positional("target").choices(["prod", "preview"]))
        .subcommand(CommandSpec::new("publish"));

    let outcome = complete(&spec, "tool p");
    assert_eq!(outcome.values(), vec!["publish", "prod", "preview"]);

    let config = CompletionConfig {
        subcommand_policy: SubcommandPolicy::PreferSubcommands,
        ..CompletionConfig::default()
    };
    let engine = CompletionEngine::new(config);
    assert_eq!(engine.complete_line(&spec, "tool p", 6).values(), vec!["publish"]);
    assert_eq!(engine.complete_line(&spec, "tool pr", 7).values(), vec!["prod", "preview"]);
}

#[test]
fn test_always_complete_options() {
    let spec = CommandSpec::new("tool")
        .action(Action::flag(["-f", "--force"]))
        .subcommand(CommandSpec::new("sync"));
    let config = CompletionConfig {
        always_complete_options: OptionCompletion::Long,
        ..CompletionConfig::default()
    };
    let outcome = CompletionEngine::new(config).complete_line(&spec, "tool ", 5);
    assert_eq!(outcome.values(), vec!["sync", "--force"]);

    assert_eq!(complete(&spec, "tool ").values(), vec!["sync"]);
}

#[test]
fn test_custom_validator_replaces_prefix_match() {
    let spec = sample_spec();
    let engine = CompletionEngine::new(CompletionConfig::default())
        .with_validator(|candidate, prefix| candidate.contains(prefix));
    let line = "myprog --protocol tt";
    let outcome = engine.complete_line(&spec, line, line.len());
    assert_eq!(outcome.values(), vec!["http", "https"]);
}

#[test]
fn test_ranked_order() {
    let spec = CommandSpec::new("prog").action(
        Action::positional("name").choices(["tag_spare_shadow", "tag_spare", "tag", "tag_a"]),
    );
    let config = CompletionConfig {
        order: CandidateOrder::Ranked,
        ..CompletionConfig::default()
    };
    let line = "prog tag";
    let outcome = CompletionEngine::new(config).complete_line(&spec, line, line.len());
    assert_eq!(
        outcome.values(),
        vec!["tag", "tag_a", "tag_spare", "tag_spare_shadow"]
    );
}

#[test]
fn test_completion_is_idempotent() {
    let spec = sample_spec();
    let first = complete(&spec, "myprog --protocol ");
    let second = complete(&spec, "myprog --protocol ");
    assert_eq!(first.values(), second.values());
    assert_eq!(first.values(), vec!["http", "https", "ssh"]);
}

#[test]
fn test_program_name_gets_nothing() {
    let spec = sample_spec();
    assert!(complete(&spec, "myp").candidates.is_empty());
}

#[test]
fn test_cursor_mid_line_ignores_tail() {
    let spec = sample_spec();
    let line = "myprog --prot --quiet";
    let outcome =
        CompletionEngine::new(CompletionConfig::default()).complete_line(&spec, line, 13);
    assert_eq!(outcome.values(), vec!["--protocol"]);
}

fn sibling_spec() -> CommandSpec {
    CommandSpec::new("prog")
        .action(Action::flag(["--quiet"]))
        .subcommand(
            CommandSpec::new("build")
                .action(Action::flag(["--release"]))
                .action(Action::flag(["--target"]).arity(Arity::One)),
        )
        .subcommand(
            CommandSpec::new("deploy")
                .action(Action::flag(["--env"]).arity(Arity::One).choices(["staging", "prod"]))
                .action(Action::flag(["--quiet"])),
        )
}

#[test]
fn test_sibling_flags_stay_in_their_subcommand() {
    let spec = sibling_spec();
    assert_eq!(complete(&spec, "prog deploy --").values(), vec!["--env", "--quiet"]);
    assert_eq!(complete(&spec, "prog build --").values(), vec!["--release", "--target"]);
    assert!(complete(&spec, "prog deploy --re").values().is_empty());
}

#[test]
fn test_flag_before_descending_offered_again_in_child() {
    let spec = sibling_spec();
    assert!(complete(&spec, "prog --quiet --").values().is_empty());
    assert_eq!(
        complete(&spec, "prog --quiet deploy --").values(),
        vec!["--env", "--quiet"]
    );
}

mod support;

use gitship::util::exec::DryRunRunner;
use gitship::{
    Config, MessageStyle, Options, Orchestrator, Outcome, RunSummary, Step, StepLog, StepStatus,
};
use support::{Answer, Reply, ScriptedRunner};

const AUTH_STATUS: &str = " M src/auth.ts\0";

/// Repository on `wip` with `src/auth.ts` modified, `main` present locally and on a
/// GitHub remote, `gh` installed.
fn auth_script() -> ScriptedRunner {
    ScriptedRunner::new()
        .ok(&["git", "rev-parse", "--abbrev-ref", "HEAD"], "wip\n")
        .on(
            &["git", "status"],
            vec![Reply::Ok(AUTH_STATUS.into()), Reply::Ok(String::new())],
        )
        .fail(&["git", "rev-parse", "--verify", "--quiet"], 1, "")
        .ok(
            &["git", "rev-parse", "--verify", "--quiet", "refs/heads/main"],
            "0f3c2a1\n",
        )
        .on(
            &["git", "rev-parse", "--verify", "--quiet", "refs/stash"],
            vec![Reply::Fail(1, String::new()), Reply::Ok("5e1f00d\n".into())],
        )
        .ok(&["git", "diff", "--cached"], "M\0src/auth.ts\0")
        .ok(&["git", "log"], "abc1234\tfix: update auth\n")
        .ok(
            &["git", "remote", "get-url"],
            "git@github.com:acme/widgets.git\n",
        )
        .ok(&["gh", "--version"], "gh version 2.40.0 (2024-01-01)\n")
        .ok(
            &["gh", "pr", "create"],
            "Creating pull request for fix/auth into main\n\nhttps://github.com/acme/widgets/pull/7\n",
        )
}

fn clean_script() -> ScriptedRunner {
    ScriptedRunner::new()
        .ok(&["git", "status"], "")
        .fail(&["git", "rev-parse", "--verify", "--quiet"], 1, "")
        .ok(
            &["git", "rev-parse", "--verify", "--quiet", "refs/heads/main"],
            "0f3c2a1\n",
        )
}

fn run_with(
    runner: &mut ScriptedRunner,
    confirm: &mut Answer,
    config: Config,
    options: Options,
) -> RunSummary {
    Orchestrator::new("/work/app", config, options, runner, confirm)
        .with_log(StepLog::silent())
        .run()
}

fn run(runner: &mut ScriptedRunner, confirm: &mut Answer) -> RunSummary {
    run_with(runner, confirm, Config::default(), Options::default())
}

fn aborted_at(summary: &RunSummary) -> (Step, String) {
    match &summary.outcome {
        Outcome::Aborted { step, error } => (*step, error.clone()),
        other => panic!("expected an aborted run, got {other:?}"),
    }
}

#[test]
fn test_auth_scenario_branches_commits_pushes_and_opens_pr() {
    let mut runner = auth_script();
    let mut confirm = Answer::no();
    let summary = run(&mut runner, &mut confirm);

    assert_eq!(summary.outcome, Outcome::Completed, "{}", summary.render(false));
    assert_eq!(summary.exit_code(), 0);
    assert!(confirm.asked.is_empty(), "no prompt expected with pending changes");

    let branch = summary.branch.as_ref().expect("branch plan");
    assert_eq!(branch.base, "main");
    assert_eq!(branch.name, "fix/auth");
    assert_eq!(summary.commit.as_ref().expect("commit").subject, "fix: update auth");
    assert_eq!(
        summary.pull_request.as_ref().expect("pr").title,
        "fix: update auth"
    );
    assert_eq!(
        summary.pull_request_url.as_deref(),
        Some("https://github.com/acme/widgets/pull/7")
    );

    let mutating: Vec<String> = runner.mutating_calls().iter().map(|c| c.line()).collect();
    assert_eq!(mutating.len(), 9, "{mutating:#?}");
    assert!(mutating[0].starts_with("git stash push --include-untracked -m"));
    assert_eq!(mutating[1], "git switch main");
    assert_eq!(mutating[2], "git pull --ff-only origin main");
    assert_eq!(mutating[3], "git switch -c fix/auth");
    assert_eq!(mutating[4], "git stash pop");
    assert_eq!(mutating[5], "git add --all");
    assert_eq!(mutating[6], "git commit -F -");
    assert_eq!(mutating[7], "git push --set-upstream origin fix/auth");
    assert!(mutating[8].starts_with("gh pr create --base main --head fix/auth --title fix: update auth --body"));

    let commit = &runner.calls_matching(&["git", "commit"])[0];
    assert_eq!(commit.stdin.as_deref(), Some("fix: update auth\n"));

    let steps: Vec<Step> = summary.completed_steps();
    assert_eq!(steps, Step::ALL.to_vec());
}

#[test]
fn test_no_changes_asks_and_decline_does_nothing() {
    let mut runner = clean_script();
    let mut confirm = Answer::no();
    let summary = run(&mut runner, &mut confirm);

    assert_eq!(summary.outcome, Outcome::NothingToDo);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(confirm.asked.len(), 1);
    assert!(confirm.asked[0].contains("no pending changes"));
    assert!(runner.mutating_calls().is_empty());
    assert!(summary.render(false).contains("nothing to do"));
}

#[test]
fn test_no_changes_continue_skips_commit_and_pr() {
    let mut runner = clean_script();
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    assert_eq!(summary.outcome, Outcome::Completed, "{}", summary.render(false));
    assert_eq!(confirm.asked.len(), 1);
    assert!(runner.calls_matching(&["git", "stash"]).is_empty());
    assert_eq!(
        summary.step(Step::Commit).map(|r| r.status),
        Some(StepStatus::Skipped)
    );
    assert_eq!(
        summary.step(Step::PullRequest).map(|r| r.status),
        Some(StepStatus::Skipped)
    );
    assert_eq!(summary.branch.as_ref().map(|b| b.name.as_str()), Some("chore/changes"));
    assert!(runner.calls_matching(&["gh", "pr"]).is_empty());
}

#[test]
fn test_dirty_tree_aborts_before_any_switch() {
    // Shelving did not clean the tree; status stays dirty.
    let mut runner = auth_script().ok(&["git", "status"], AUTH_STATUS);
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::SyncBase);
    assert!(error.contains("working tree is not clean"), "{error}");
    assert!(error.contains("src/auth.ts"), "{error}");
    assert_eq!(summary.exit_code(), 1);
    assert!(runner.calls_matching(&["git", "switch"]).is_empty());
    assert!(summary.next_steps.iter().any(|s| s.contains("git stash pop")));
    assert!(summary.next_steps.iter().any(|s| s.contains("git switch wip")));
}

#[test]
fn test_stash_without_new_entry_is_not_reported_as_shelved() {
    // An older stash entry exists and `stash push` saves nothing new.
    let mut runner = auth_script()
        .ok(&["git", "status"], " M vendor/lib\0")
        .ok(
            &["git", "rev-parse", "--verify", "--quiet", "refs/stash"],
            "a1b2c3d\n",
        )
        .ok(&["git", "stash", "push"], "No local changes to save\n");
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::SyncBase);
    assert!(error.contains("vendor/lib"), "{error}");
    assert_eq!(runner.calls_matching(&["git", "stash", "push"]).len(), 1);
    assert!(runner.calls_matching(&["git", "stash", "pop"]).is_empty());
    assert!(!summary.next_steps.iter().any(|s| s.contains("stash pop")));
    assert!(!summary.next_steps.iter().any(|s| s.contains("git switch wip")));
}

#[test]
fn test_unresolved_conflicts_abort_before_any_mutation() {
    let mut runner = auth_script().ok(&["git", "status"], "UU src/auth.ts\0 M README.md\0");
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::InspectStatus);
    assert_eq!(error, "unresolved conflicts in 1 file(s): src/auth.ts");
    assert_eq!(summary.exit_code(), 1);
    assert!(runner.mutating_calls().is_empty());
    assert!(confirm.asked.is_empty());
    assert!(summary.next_steps.iter().any(|s| s.contains("resolve the conflicts")));
}

#[test]
fn test_missing_base_branch_aborts_without_mutation() {
    let mut runner = auth_script().fail(
        &["git", "rev-parse", "--verify", "--quiet", "refs/heads/main"],
        1,
        "",
    );
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::ResolveBase);
    assert_eq!(error, "no base branch found (looked for: main, master)");
    assert!(runner.mutating_calls().is_empty());
    assert_eq!(
        runner
            .calls_matching(&["git", "rev-parse", "--verify", "--quiet", "refs/remotes/origin/master"])
            .len(),
        1
    );
    assert!(summary
        .next_steps
        .iter()
        .any(|s| s.contains("--base <name>")));
}

#[test]
fn test_base_found_on_remote_only() {
    let mut runner = auth_script()
        .fail(
            &["git", "rev-parse", "--verify", "--quiet", "refs/heads/main"],
            1,
            "",
        )
        .ok(
            &["git", "rev-parse", "--verify", "--quiet", "refs/remotes/origin/master"],
            "9d8e7f6\n",
        );
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    assert_eq!(summary.outcome, Outcome::Completed, "{}", summary.render(false));
    assert_eq!(summary.branch.as_ref().map(|b| b.base.as_str()), Some("master"));
    assert_eq!(runner.calls_matching(&["git", "pull", "--ff-only", "origin", "master"]).len(), 1);
}

#[test]
fn test_hosting_cli_absent_succeeds_with_manual_steps() {
    let mut runner = auth_script().on(&["gh", "--version"], vec![Reply::Missing]);
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    assert_eq!(summary.outcome, Outcome::Completed, "{}", summary.render(false));
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(runner.calls_matching(&["git", "push"]).len(), 1);
    assert!(runner.calls_matching(&["gh", "pr"]).is_empty());
    assert_eq!(
        summary.step(Step::PullRequest).map(|r| r.status),
        Some(StepStatus::Degraded)
    );
    let pr = summary.pull_request.as_ref().expect("pr plan");
    assert!(!pr.hosting_available);
    assert!(summary
        .next_steps
        .iter()
        .any(|s| s.contains("gh pr create --base main --head fix/auth")));
    assert!(summary
        .next_steps
        .iter()
        .any(|s| s.ends_with("https://github.com/acme/widgets/compare/main...fix/auth?expand=1")));
}

#[test]
fn test_existing_branch_name_gets_suffix() {
    let mut runner = auth_script().ok(
        &["git", "rev-parse", "--verify", "--quiet", "refs/heads/fix/auth"],
        "1234567\n",
    );
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    assert_eq!(summary.branch.as_ref().map(|b| b.name.as_str()), Some("fix/auth-2"));
    assert_eq!(runner.calls_matching(&["git", "switch", "-c", "fix/auth-2"]).len(), 1);
    assert_eq!(
        runner
            .calls_matching(&["git", "push", "--set-upstream", "origin", "fix/auth-2"])
            .len(),
        1
    );
}

#[test]
fn test_branch_name_taken_on_remote_gets_suffix() {
    let mut runner = auth_script().ok(
        &["git", "rev-parse", "--verify", "--quiet", "refs/remotes/origin/fix/auth"],
        "89abcde\n",
    );
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    assert_eq!(summary.outcome, Outcome::Completed, "{}", summary.render(false));
    assert_eq!(summary.branch.as_ref().map(|b| b.name.as_str()), Some("fix/auth-2"));
    assert_eq!(
        runner
            .calls_matching(&["git", "rev-parse", "--verify", "--quiet", "refs/remotes/origin/fix/auth-2"])
            .len(),
        1
    );
    let pushes: Vec<String> = runner
        .calls_matching(&["git", "push"])
        .iter()
        .map(|c| c.line())
        .collect();
    assert_eq!(pushes, vec!["git push --set-upstream origin fix/auth-2".to_string()]);
}

#[test]
fn test_push_failure_is_fatal_and_keeps_commit() {
    let mut runner = auth_script().fail(
        &["git", "push"],
        128,
        "fatal: unable to access 'https://github.com/acme/widgets.git/': Could not resolve host",
    );
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::Push);
    assert!(error.contains("Could not resolve host"), "{error}");
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(summary.step(Step::Push).and_then(|r| r.exit_code), Some(128));
    assert!(summary.commit.is_some());
    assert!(runner.calls_matching(&["gh"]).is_empty());
    assert!(summary
        .next_steps
        .iter()
        .any(|s| s.contains("git push --set-upstream origin fix/auth")));
    assert!(!summary.next_steps.iter().any(|s| s.contains("stash pop")));
}

#[test]
fn test_pull_failure_reports_git_stderr_and_shelved_changes() {
    let mut runner = auth_script().fail(
        &["git", "pull"],
        1,
        "fatal: Not possible to fast-forward, aborting.",
    );
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::SyncBase);
    assert!(error.contains("Not possible to fast-forward"), "{error}");
    assert!(runner.calls_matching(&["git", "switch", "-c"]).is_empty());
    assert!(summary.next_steps.iter().any(|s| s.contains("git stash pop")));
}

#[test]
fn test_stash_pop_conflict_is_reported() {
    let mut runner = auth_script().fail(
        &["git", "stash", "pop"],
        1,
        "CONFLICT (content): Merge conflict in src/auth.ts",
    );
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::CreateBranch);
    assert!(error.contains("Merge conflict in src/auth.ts"), "{error}");
    assert!(runner.calls_matching(&["git", "commit"]).is_empty());
    assert!(summary.next_steps.iter().any(|s| s.contains("git stash drop")));
}

#[test]
fn test_missing_git_maps_to_127() {
    let mut runner = ScriptedRunner::new().on(&["git"], vec![Reply::Missing]);
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::InspectStatus);
    assert!(error.starts_with("failed to start `git status"), "{error}");
    assert_eq!(summary.exit_code(), 127);
    assert!(confirm.asked.is_empty());
}

#[test]
fn test_dry_run_plans_without_mutating() {
    let mut runner = auth_script()
        .ok(&["git", "status"], AUTH_STATUS)
        .ok(&["git", "diff", "--cached"], "")
        .fail(&["git", "log"], 128, "fatal: bad revision 'main..fix/auth'");
    let mut confirm = Answer::yes();
    let options = Options {
        dry_run: true,
        ..Options::default()
    };
    let summary = Orchestrator::new(
        "/work/app",
        Config::default(),
        options,
        DryRunRunner::new(&mut runner, false),
        &mut confirm,
    )
    .with_log(StepLog::silent())
    .run();

    assert_eq!(summary.outcome, Outcome::Completed, "{}", summary.render(false));
    assert!(summary.dry_run);
    assert!(runner.mutating_calls().is_empty());
    assert_eq!(summary.commit.as_ref().map(|c| c.subject.as_str()), Some("fix: update auth"));
    assert_eq!(
        summary.pull_request.as_ref().map(|p| p.title.as_str()),
        Some("fix: update auth")
    );
    assert!(summary.pull_request_url.is_none());
    assert!(summary.render(false).starts_with("gitship: dry-run complete"));
}

#[test]
fn test_message_override_and_no_pr() {
    let mut runner = auth_script();
    let mut confirm = Answer::yes();
    let options = Options {
        message: Some("fix(auth): refresh expired tokens".into()),
        no_pr: true,
        ..Options::default()
    };
    let summary = run_with(&mut runner, &mut confirm, Config::default(), options);

    assert_eq!(summary.outcome, Outcome::Completed);
    let commit = &runner.calls_matching(&["git", "commit"])[0];
    assert_eq!(commit.stdin.as_deref(), Some("fix(auth): refresh expired tokens\n"));
    assert_eq!(
        summary.step(Step::PullRequest).map(|r| r.status),
        Some(StepStatus::Skipped)
    );
    assert!(runner.calls_matching(&["gh"]).is_empty());
}

#[test]
fn test_plain_style_and_custom_remote() {
    let mut runner = auth_script();
    let mut confirm = Answer::yes();
    let config = Config {
        message_style: MessageStyle::Plain,
        remote: "upstream".into(),
        ..Config::default()
    };
    let summary = run_with(&mut runner, &mut confirm, config, Options::default());

    assert_eq!(summary.outcome, Outcome::Completed);
    assert_eq!(summary.commit.as_ref().map(|c| c.subject.as_str()), Some("Update auth"));
    assert_eq!(runner.calls_matching(&["git", "pull", "--ff-only", "upstream", "main"]).len(), 1);
    assert_eq!(
        runner
            .calls_matching(&["git", "push", "--set-upstream", "upstream", "fix/auth"])
            .len(),
        1
    );
}

#[test]
fn test_pr_creation_failure_lists_manual_command() {
    let mut runner = auth_script().fail(
        &["gh", "pr", "create"],
        1,
        "To get started with GitHub CLI, please run:  gh auth login",
    );
    let mut confirm = Answer::yes();
    let summary = run(&mut runner, &mut confirm);

    let (step, error) = aborted_at(&summary);
    assert_eq!(step, Step::PullRequest);
    assert!(error.contains("gh auth login"), "{error}");
    assert_eq!(runner.calls_matching(&["git", "push"]).len(), 1);
    assert!(summary
        .next_steps
        .iter()
        .any(|s| s.contains("gh pr create --base main --head fix/auth")));
}

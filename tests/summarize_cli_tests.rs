mod common;

use common::TestEnv;

/// Config that replaces the model with a shell script printing a fixed answer
fn fake_model_config(answer: &str) -> String {
    format!(
        "[llm]\ncommand = \"sh\"\nargs = [\"-c\", \"cat > /dev/null; printf '{}'\"]\n\n[output]\ndebug_artifacts = false\n",
        answer
    )
}

#[test]
fn summarize_subcommand_is_available() {
    let output = TestEnv::new().run(&["summarize", "--help"]);

    assert!(
        output.status.success(),
        "summarize --help should succeed\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("--skip-check"));
}

#[test]
fn summarize_requires_a_url() {
    let output = TestEnv::new().run(&["summarize"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--url"));
}

#[test]
fn summarize_reports_missing_input_file() {
    let output = TestEnv::new().run(&[
        "summarize",
        "--input",
        "/definitely/not/here.txt",
        "--url",
        "https://example.com",
        "--skip-check",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to read /definitely/not/here.txt"),
        "expected input error, got:\n{}",
        stderr
    );
}

#[test]
fn summarize_rejects_empty_input() {
    let output = TestEnv::new().run_with_stdin(
        &["summarize", "--url", "https://example.com", "--skip-check"],
        " \n\t ",
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Input text is empty"),
        "expected empty input error, got:\n{}",
        stderr
    );
}

#[cfg(unix)]
#[test]
fn summarize_end_to_end_with_stand_in_model() {
    let env = TestEnv::new();
    env.write_config(&fake_model_config(
        "Summary:\\n1. Budget approved\\n2. Hiring paused\\nConclusion:\\nSteady quarter.\\nAction Items:\\n- Send minutes",
    ));
    let out_dir = env.scratch_dir().join("summaries");

    let output = env.run_with_stdin(
        &[
            "summarize",
            "--url",
            "https://example.com/q3",
            "--output-dir",
            out_dir.to_str().unwrap(),
            "--json",
        ],
        "We reviewed the budget. It was approved. Hiring is paused for now.",
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "summarize should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );

    let response: serde_json::Value = serde_json::from_str(&stdout).expect("JSON response");
    assert_eq!(response["success"], true);
    assert_eq!(response["record"]["summary"][1], "Hiring paused");
    assert_eq!(response["record"]["conclusion"], "Steady quarter.");

    let path = response["output_path"].as_str().expect("output path");
    assert!(path.starts_with(out_dir.to_str().unwrap()));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).expect("saved summary")).unwrap();
    assert_eq!(saved["metadata"]["source_url"], "https://example.com/q3");
    assert_eq!(saved["metadata"]["version"], "1.0");
    assert_eq!(saved["content"]["action_items"][0], "Send minutes");
}

#[cfg(unix)]
#[test]
fn summarize_fails_when_model_command_fails() {
    let env = TestEnv::new();
    env.write_config(
        "[llm]\ncommand = \"sh\"\nargs = [\"-c\", \"cat > /dev/null; echo boom >&2; exit 4\"]\n",
    );

    let output = env.run_with_stdin(
        &["summarize", "--url", "https://example.com"],
        "Some transcript text.",
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(
        stderr.contains("exited with status 4"),
        "expected inference failure, got:\n{}",
        stderr
    );
}

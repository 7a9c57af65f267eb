//! Exit code contracts
//!
//! Callers script against exit codes, and `--json` keeps stdout parseable
//! even on failure.

use crate::common::*;

#[test]
fn contract_successful_init_exits_zero() {
    let env = TestEnv::new();
    let result = env.init("api", &[]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
}

#[test]
fn contract_json_init_emits_result_event() {
    let env = TestEnv::new();
    let result = env.init("api", &["--json"]);
    assert!(result.success, "{}", result.stderr);

    let event: serde_json::Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(event["event"], "result");
    assert_eq!(event["command"], "init");
    assert_eq!(event["exit_code"], 0);
    assert_eq!(event["report"]["port"], 3000);
    assert_eq!(event["report"]["allocated"], true);
}

#[test]
fn contract_json_failure_is_one_error_line() {
    let env = TestEnv::new();
    let result = env.run(&["status", "--json", "--config", "missing/docklift.yml"]);
    assert_eq!(result.exit_code, 2);

    let lines: Vec<&str> = result.stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout: {}", result.stdout);
    let event: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(event["event"], "error");
    assert_eq!(event["outcome"], "validation");
    assert_eq!(event["exit_code"], 2);
}

#[test]
fn contract_bad_engine_config_is_a_validation_failure() {
    let env = TestEnv::new();
    let config = env.workspace.path().join("engine.toml");
    env.write(&config, "[health]\nattempts = \"many\"\n");

    let result = env.run(&[
        "status",
        "--engine-config",
        config.to_str().unwrap(),
        "--config",
        "missing/docklift.yml",
    ]);
    assert_eq!(result.exit_code, 2);
    assert!(result.stderr.contains("engine.toml"), "{}", result.stderr);
}

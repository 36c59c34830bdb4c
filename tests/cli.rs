use std::fs;

use pretty_assertions::assert_eq;

fn command(dir: &tempfile::TempDir) -> std::process::Command {
    let mut cmd = test_bin::get_test_bin("rift-frames");
    cmd.arg("--config").arg(dir.path().join("missing.toml"));
    cmd
}

#[test]
fn runs_a_script_and_prints_the_layout() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("session");
    fs::write(
        &script,
        "# two clients side by side\nmanage 0x1\nmanage 0x2\nsplit explode\ndump\n",
    )
    .unwrap();

    let output = command(&dir).args(["--rect", "100x100+0+0", "run"]).arg(&script).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("(split vertical:0.5:1 (clients vertical:0 0x1) (clients vertical:0 0x2))")
    );
    let json: String = lines.collect::<Vec<_>>().join("\n");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["focus"], 2);
    assert_eq!(value["steps"][0]["geometry"]["height"], 50);
    assert_eq!(value["steps"][1]["geometry"]["y"], 50);
}

#[test]
fn explode_on_a_wide_screen_splits_side_by_side() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("session");
    fs::write(&script, "manage 0x1\nmanage 0x2\nsplit explode\ndump\n").unwrap();

    let output = command(&dir).args(["--rect", "1920x1080+0+0", "run"]).arg(&script).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.lines().next(),
        Some("(split horizontal:0.5:1 (clients vertical:0 0x1) (clients vertical:0 0x2))")
    );
}

#[test]
fn failing_commands_set_the_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("session");
    fs::write(&script, "frobnicate\nremove\n").unwrap();

    let output = command(&dir).arg("run").arg(&script).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown command \"frobnicate\""));
}

#[test]
fn check_normalizes_descriptions() {
    let dir = tempfile::tempdir().unwrap();
    let output = command(&dir)
        .args(["check", "(split", "horizontal:0.30:0", "(clients", "max:5", "0x1)", "(clients", "grid:0))"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap().trim_end(),
        "(split horizontal:0.3:0 (clients max:0 0x1) (clients grid:0))"
    );

    let output = command(&dir).args(["check", "(clients", "spiral:0)"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

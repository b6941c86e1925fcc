use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskbook-{nanos}-{file_name}"))
}

fn run_interactive(input: &str) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_taskbook");
    let store_path = temp_path("cli-interactive.json");
    let config_path = temp_path("cli-interactive-config.json");

    let mut child = Command::new(exe)
        .env("TASKBOOK_STORE_PATH", &store_path)
        .env("TASKBOOK_CONFIG_PATH", &config_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    let output = child
        .wait_with_output()
        .expect("failed to read interactive output");

    std::fs::remove_file(&store_path).ok();
    std::fs::remove_file(&config_path).ok();
    output
}

#[test]
fn interactive_help_shows_usage() {
    let output = run_interactive("help\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_question_mark_shows_usage() {
    let output = run_interactive("?\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_invalid_command_prints_error() {
    let output = run_interactive("nope\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn interactive_add_command_succeeds() {
    let output = run_interactive("add \"demo task\"\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: demo task"));
}

#[test]
fn interactive_session_works_on_one_list() {
    let output = run_interactive("add \"first\"\nadd \"second\"\nlist\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: first"));
    assert!(stdout.contains("Added task: second"));
    assert!(stdout.contains("ID"));
    assert!(stdout.contains("first"));
    assert!(stdout.contains("second"));
}

#[test]
fn interactive_error_does_not_end_the_session() {
    let output = run_interactive("nope\nadd \"after error\"\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: after error"));
}

#[test]
fn interactive_unterminated_quote_reports_error() {
    let output = run_interactive("add \"unfinished\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unterminated quote"));
}

#[test]
fn interactive_exit_is_case_insensitive() {
    let output = run_interactive("QUIT\n");
    assert!(output.status.success());
}

#[cfg(unix)]
#[test]
fn interactive_storage_failure_warns_and_keeps_the_session_list() {
    let exe = env!("CARGO_BIN_EXE_taskbook");
    let blocker = temp_path("cli-interactive-blocker");
    std::fs::write(&blocker, "").unwrap();
    let store_path = blocker.join("tasks.json");
    let config_path = temp_path("cli-interactive-blocker-config.json");

    let mut child = Command::new(exe)
        .env("TASKBOOK_STORE_PATH", &store_path)
        .env("TASKBOOK_CONFIG_PATH", &config_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(b"add \"ghost task\"\nlist\nexit\n")
            .expect("failed to write to stdin");
    }

    let output = child
        .wait_with_output()
        .expect("failed to read interactive output");
    std::fs::remove_file(&blocker).ok();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARN"));
    assert!(stderr.contains("storage_error"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ghost task"));
}

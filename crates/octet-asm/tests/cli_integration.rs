//! Integration tests for the octet-asm CLI.

use std::fs;

use assert_cmd::Command;
use clap as _;
use log as _;
use octet_asm as _;
use octet_core::codec::{long_form, short_form};
use rstest as _;
use simplelog as _;
use thiserror as _;

const TWO_MOVES: &str = "MOV NUM0 R0\nMOV NUM73 R1\n";

fn octet_asm() -> Command {
    Command::cargo_bin("octet-asm").expect("binary is built")
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[test]
fn assembles_stdin_to_array() {
    octet_asm()
        .write_stdin(TWO_MOVES)
        .assert()
        .success()
        .stdout("[1, 0, 0, 1, 73, 1]\n");
}

#[test]
fn assembles_file_to_state_named_after_stem() {
    let dir = tempfile::tempdir().expect("temp dir");
    let source = dir.path().join("hello.oasm");
    fs::write(&source, TWO_MOVES).expect("write source");

    let text = stdout_of(octet_asm().arg(&source).args(["--emit", "state"]));

    let (image, warnings) = long_form::decode(&text);
    assert!(warnings.is_empty());
    assert_eq!(image.filename.as_deref(), Some("hello"));
    assert_eq!(&image.memory[..6], &[1, 0, 0, 1, 73, 1]);
}

#[test]
fn url_output_decodes_back() {
    let text = stdout_of(
        octet_asm()
            .args(["--emit", "url", "--name", "demo"])
            .write_stdin(TWO_MOVES),
    );

    let image = short_form::decode(text.trim()).expect("valid query");
    assert_eq!(image.filename.as_deref(), Some("demo"));
    assert_eq!(&image.memory[..6], &[1, 0, 0, 1, 73, 1]);
}

#[test]
fn writes_output_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().join("prog.txt");

    octet_asm()
        .arg("-o")
        .arg(&out)
        .write_stdin("NOP\nRET\n")
        .assert()
        .success()
        .stdout("");

    assert_eq!(fs::read_to_string(&out).expect("output"), "[0, 38]\n");
}

#[test]
fn reports_error_with_line_number() {
    let output = octet_asm()
        .write_stdin("NOP\nMOV NUM1 R9\n")
        .output()
        .expect("runs");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("line 2: register `R9` is out of range"),
        "stderr: {stderr}"
    );
}

#[test]
fn missing_input_file_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    octet_asm()
        .arg(dir.path().join("absent.oasm"))
        .assert()
        .failure()
        .code(1);
}

use assert_cmd::Command;

#[test]
fn cli_help_runs() {
    let mut cmd = Command::cargo_bin("exif2kmz").unwrap();
    cmd.arg("--help").assert().success();
}

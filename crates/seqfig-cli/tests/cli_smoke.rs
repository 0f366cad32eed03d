use assert_cmd::prelude::*;
use std::fs;
use std::process::Command;

fn seqfig() -> Command {
    Command::new(assert_cmd::cargo_bin!("seqfig"))
}

fn png_size(bytes: &[u8]) -> (u32, u32) {
    let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
    let reader = decoder.read_info().expect("png header");
    let info = reader.info();
    (info.width, info.height)
}

#[test]
fn no_arguments_writes_pdf_and_png_into_the_working_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");

    let out = seqfig()
        .current_dir(tmp.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("run seqfig");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(
        out.stderr.is_empty(),
        "default run should be silent on stderr, got: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        "Sequence diagram saved as research-sequence.pdf and research-sequence.png"
    );

    let pdf = fs::read(tmp.path().join("research-sequence.pdf")).expect("read pdf");
    assert!(pdf.starts_with(b"%PDF-"));

    let png = fs::read(tmp.path().join("research-sequence.png")).expect("read png");
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
    // A cropped 3.5 x 6 in column at 300 dpi.
    let (w, h) = png_size(&png);
    assert!(w > 600 && w <= 1110, "width {w}");
    assert!(h > 1200 && h <= 1860, "height {h}");
    assert!(h > w);
}

#[test]
fn format_name_and_out_dir_flags_select_the_outputs() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("figs");
    fs::create_dir(&out_dir).unwrap();

    seqfig()
        .current_dir(tmp.path())
        .args(["--out-dir", "figs", "--name", "fig3", "--format", "svg"])
        .args(["--format", "jpg", "--dpi", "72"])
        .assert()
        .success();

    let svg = fs::read_to_string(out_dir.join("fig3.svg")).expect("read svg");
    assert!(svg.starts_with("<svg"));
    let jpg = fs::read(out_dir.join("fig3.jpg")).expect("read jpg");
    assert!(jpg.starts_with(&[0xFF, 0xD8, 0xFF]));
    assert!(!out_dir.join("fig3.pdf").exists());
    assert!(!out_dir.join("fig3.png").exists());
}

#[test]
fn config_file_overrides_step_sizes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("uniform.json"), r#"{ "returnStep": 0.35 }"#).unwrap();

    seqfig()
        .current_dir(tmp.path())
        .args(["--format", "svg", "--name", "default"])
        .assert()
        .success();
    seqfig()
        .current_dir(tmp.path())
        .args(["--format", "svg", "--name", "uniform", "--config", "uniform.json"])
        .assert()
        .success();

    let default = fs::read_to_string(tmp.path().join("default.svg")).unwrap();
    let uniform = fs::read_to_string(tmp.path().join("uniform.svg")).unwrap();
    assert_ne!(default, uniform);
}

#[test]
fn scenario_with_unknown_actor_fails_with_exit_code_1() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let scenario = r#"{
        "actors": [{"id": "researcher", "x": 1.5, "label": "Researcher"}],
        "focus": "researcher",
        "steps": [
            {"type": "message", "from": "researcher", "to": "github", "kind": "call", "label": "search_code", "detail": "q"}
        ]
    }"#;
    fs::write(tmp.path().join("scenario.json"), scenario).unwrap();

    let out = seqfig()
        .current_dir(tmp.path())
        .args(["--scenario", "scenario.json"])
        .output()
        .expect("run seqfig");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown actor: github"));
    assert!(!tmp.path().join("research-sequence.pdf").exists());
}

#[test]
fn missing_out_dir_fails_with_exit_code_1() {
    let tmp = tempfile::tempdir().expect("tempdir");

    let out = seqfig()
        .current_dir(tmp.path())
        .args(["--out-dir", "nope"])
        .output()
        .expect("run seqfig");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to write"));
}

#[test]
fn unknown_format_is_a_usage_error() {
    seqfig().args(["--format", "tiff"]).assert().code(2);
}

use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_simreel")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "simreel.exe"
            } else {
                "simreel"
            });
            p
        })
}

fn model_path() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/arm.json").to_string()
}

#[test]
fn cli_screenshot_writes_initial_and_final_png() {
    let dir = PathBuf::from("target").join("cli_smoke").join("shots");
    let _ = std::fs::remove_dir_all(&dir);
    let dir_arg = dir.to_string_lossy().to_string();

    let status = std::process::Command::new(exe())
        .args([
            "screenshot",
            "--model",
            model_path().as_str(),
            "--keyframe",
            "salute",
            "--duration",
            "0.1",
            "--width",
            "64",
            "--height",
            "48",
            "--name",
            "arm",
            "--out-dir",
            dir_arg.as_str(),
        ])
        .status()
        .unwrap();

    assert!(status.success());
    for name in ["arm_initial.png", "arm_final.png"] {
        let img = image::open(dir.join(name)).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }
}

#[test]
fn cli_rejects_unknown_camera() {
    let dir = PathBuf::from("target").join("cli_smoke").join("bad_camera");
    let dir_arg = dir.to_string_lossy().to_string();

    let out = std::process::Command::new(exe())
        .args([
            "screenshot",
            "--model",
            model_path().as_str(),
            "--camera",
            "overhead",
            "--out-dir",
            dir_arg.as_str(),
        ])
        .output()
        .unwrap();

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown camera 'overhead'"), "{stderr}");
    assert!(!dir.join("robotic_arm_initial.png").exists());
}

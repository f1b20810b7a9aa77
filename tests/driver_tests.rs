//! End-to-end runs of the `wfc_studio` binary on small sample files.

use std::fs;
use std::path::Path;
use std::process::Command;

const TILESET: &str = r#"<set>
  <tiles>
    <tile name="black" color="000000"/>
    <tile name="white" color="FFFFFF"/>
  </tiles>
  <neighbors>
    <neighbor left="black" right="white"/>
    <neighbor left="white" right="black"/>
    <neighbor top="black" bottom="white"/>
    <neighbor top="white" bottom="black"/>
  </neighbors>
</set>"#;

fn write_samples(dir: &Path, samples: &str) {
    fs::create_dir_all(dir.join("tilesets")).unwrap();
    fs::write(dir.join("tilesets/Checkers.xml"), TILESET).unwrap();
    fs::write(dir.join("samples.xml"), samples).unwrap();
}

fn run(dir: &Path, seed: i32) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_wfc_studio"))
        .arg("--samples")
        .arg(dir.join("samples.xml"))
        .arg("--output")
        .arg(dir.join("out"))
        .arg("--seed")
        .arg(seed.to_string())
        .arg("--pixel-size")
        .arg("2")
        .output()
        .unwrap()
}

fn files_with_extension(dir: &Path, ext: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == ext))
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_driver_writes_images_text_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    write_samples(
        dir.path(),
        r#"<samples>
            <simpletiled name="Checkers" tileset="tilesets/Checkers.xml" size="6"
                periodic="True" screenshots="2" textOutput="True"/>
            <overlapping name="Skipped" N="3"/>
        </samples>"#,
    );
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("stale.png"), b"old").unwrap();

    let output = run(dir.path(), 7);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let pngs = files_with_extension(&out, "png");
    assert_eq!(pngs.len(), 2, "{:?}", pngs);
    assert!(pngs.iter().all(|n| n.starts_with("Checkers ")));
    assert!(!out.join("stale.png").exists());

    let img = image::open(out.join(&pngs[0])).unwrap();
    assert_eq!((img.width(), img.height()), (12, 12));

    for txt in files_with_extension(&out, "txt") {
        let text = fs::read_to_string(out.join(txt)).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 6);
        assert_ne!(rows[0], rows[1]);
        assert!(rows.iter().all(|r| r.split(' ').count() == 6));
    }

    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("stats.json")).unwrap()).unwrap();
    let reports = stats.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["name"], "Checkers");
    assert_eq!(reports[0]["timings"]["successes"], 2);
    assert_eq!(reports[0]["timings"]["contradictions"], 0);
}

#[test]
fn test_driver_same_seed_same_files() {
    let samples = r#"<samples>
        <simpletiled name="Checkers" tileset="tilesets/Checkers.xml" size="5"
            heuristic="MRV" screenshots="3"/>
    </samples>"#;
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    write_samples(a.path(), samples);
    write_samples(b.path(), samples);

    assert!(run(a.path(), 99).status.success());
    assert!(run(b.path(), 99).status.success());

    let names = files_with_extension(&a.path().join("out"), "png");
    assert_eq!(names, files_with_extension(&b.path().join("out"), "png"));
    for name in &names {
        let left = fs::read(a.path().join("out").join(name)).unwrap();
        let right = fs::read(b.path().join("out").join(name)).unwrap();
        assert_eq!(left, right, "{} differs", name);
    }
}

#[test]
fn test_driver_limit_and_missing_tileset() {
    let dir = tempfile::tempdir().unwrap();
    write_samples(
        dir.path(),
        r#"<samples>
            <simpletiled name="Checkers" tileset="tilesets/Checkers.xml" size="8"
                limit="0" screenshots="1" attempts="3"/>
        </samples>"#,
    );
    assert!(run(dir.path(), 1).status.success());
    let out = dir.path().join("out");
    assert!(files_with_extension(&out, "png").is_empty());
    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("stats.json")).unwrap()).unwrap();
    assert_eq!(stats[0]["timings"]["limit_hits"], 3);

    fs::write(
        dir.path().join("samples.xml"),
        r#"<samples><simpletiled name="Nowhere" tileset="tilesets/Nowhere.xml"/></samples>"#,
    )
    .unwrap();
    let output = run(dir.path(), 1);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nowhere"));
}

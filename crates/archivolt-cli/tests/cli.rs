use assert_cmd::Command;

const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/"
       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
       identifier="id-model-1">
  <name>CLI Model</name>
  <elements>
    <element identifier="id-a" xsi:type="ApplicationComponent">
      <name>Service A</name>
    </element>
  </elements>
  <relationships/>
  <views>
    <viewpoints>
      <viewpoint identifier="id-vp"><name>Default</name></viewpoint>
    </viewpoints>
    <diagrams>
      <view identifier="id-view-1" xsi:type="Diagram">
        <name>Main</name>
        <node identifier="id-n1" elementRef="id-a" xsi:type="Element" x="0" y="0" w="120" h="60"/>
      </view>
    </diagrams>
  </views>
</model>"#;

fn write_inputs(dir: &tempfile::TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let template = dir.path().join("template.xml");
    std::fs::write(&template, TEMPLATE).unwrap();
    let overrides = dir.path().join("override.json");
    std::fs::write(
        &overrides,
        r#"{"elements": [{"id": "id-a", "documentation": {"text": "Line1\nLine2"}}]}"#,
    )
    .unwrap();
    (template, overrides)
}

#[test]
fn no_arguments_exits_with_usage_code() {
    Command::cargo_bin("archivolt-cli")
        .unwrap()
        .assert()
        .failure()
        .code(2);
}

#[test]
fn generate_writes_patched_xml_with_cr_entities() {
    let dir = tempfile::tempdir().unwrap();
    let (template, overrides) = write_inputs(&dir);
    let out = dir.path().join("out").join("patched.xml");

    Command::cargo_bin("archivolt-cli")
        .unwrap()
        .args([
            "generate",
            template.to_str().unwrap(),
            overrides.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("Line1&#xD;\nLine2"));
    assert!(!written.contains("&amp;#xD;"));
}

#[test]
fn merge_prints_consolidated_model() {
    let dir = tempfile::tempdir().unwrap();
    let (template, overrides) = write_inputs(&dir);

    let assert = Command::cargo_bin("archivolt-cli")
        .unwrap()
        .args([
            "merge",
            template.to_str().unwrap(),
            overrides.to_str().unwrap(),
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["model_identifier"], "id-model-1");
    assert_eq!(
        value["elements"][0]["documentation"]["text"],
        "Line1\nLine2"
    );
}

#[test]
fn render_emits_svg_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let (template, _) = write_inputs(&dir);
    let out_dir = dir.path().join("renders");

    let assert = Command::cargo_bin("archivolt-cli")
        .unwrap()
        .args([
            "render",
            template.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["views"][0]["name"], "Main");
    let svg_path = value["views"][0]["svg_path"].as_str().unwrap();
    assert!(std::path::Path::new(svg_path).exists());
    assert!(
        value["views"][0]["svg_data_uri"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,")
    );
}

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use protodyn_cli::config::{self, LogFormat};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
naming:
  namespace: "acme.events"
  prefixx: "x" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.naming.namespace, "protodyn.sample");
    assert!(!cfg.output.pretty);
    assert_eq!(cfg.log.format, LogFormat::Text);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
naming:
  namespace: acme.events
output:
  pretty: true
log:
  format: json
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.naming().expand("Order"), "acme.events.Order");
    assert!(cfg.output.pretty);
    assert_eq!(cfg.log.format, LogFormat::Json);
}

#[test]
fn version_and_namespace_are_validated() {
    for bad in [
        "version: 2\n",
        "version: 1\nnaming:\n  namespace: \"\"\n",
        "version: 1\nnaming:\n  namespace: \"acme..events\"\n",
        "version: 1\nnaming:\n  namespace: \"9lives\"\n",
        "version: 1\nlog:\n  format: xml\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.code().as_str(), "CONFIG", "{bad}");
    }
}

#[test]
fn load_from_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = config::load_from_file(&dir.path().join("absent.yaml")).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");

    let path = dir.path().join("protodyn.yaml");
    std::fs::write(&path, "version: 1\noutput:\n  pretty: true\n").unwrap();
    assert!(config::resolve(Some(path.as_path())).unwrap().output.pretty);
}

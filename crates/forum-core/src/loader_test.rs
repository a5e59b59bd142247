use super::*;
use crate::assets::DirSource;
use crate::unit::UnitKind;
use std::path::Path;
use tempfile::TempDir;

fn fixtures() -> DirSource {
    DirSource::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

fn scratch(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, body) in files {
        let path = tmp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }
    tmp
}

#[test]
fn test_load_unit_derives_name() {
    let unit = load_unit(&fixtures(), "units", "users.yaml").unwrap();
    assert_eq!(unit.name, "users");
    assert_eq!(unit.depends_on.len(), 1);
    assert_eq!(unit.kind, UnitKind::Migration);
}

#[test]
fn test_load_unit_nested_name_keeps_directory() {
    let unit = load_unit(&fixtures(), "units", "extras/audit.yaml").unwrap();
    assert_eq!(unit.name, "extras/audit");
}

#[test]
fn test_load_unit_rejects_other_extensions() {
    let tmp = scratch(&[("m/a.yml", "depends_on: [nothing]")]);
    let err = load_unit(&DirSource::new(tmp.path()), "m", "a.yml").unwrap_err();
    assert!(matches!(err, CoreError::UnknownExtension { .. }));

    let err = load_unit(&DirSource::new(tmp.path()), "m", "ayaml").unwrap_err();
    assert!(matches!(err, CoreError::UnknownExtension { .. }));
}

#[test]
fn test_load_unit_empty_name() {
    let tmp = scratch(&[("m/.yaml", "depends_on: [nothing]")]);
    let err = load_unit(&DirSource::new(tmp.path()), "m", ".yaml").unwrap_err();
    assert!(matches!(err, CoreError::EmptyUnitName { .. }));
}

#[test]
fn test_load_unit_missing_file() {
    let err = load_unit(&fixtures(), "units", "ghost.yaml").unwrap_err();
    match err {
        CoreError::UnitFileNotFound { path } => assert_eq!(path, "units/ghost.yaml"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_unit_decode_failure() {
    let tmp = scratch(&[("m/bad.yaml", "depends_on: {not: a list}")]);
    let err = load_unit(&DirSource::new(tmp.path()), "m", "bad.yaml").unwrap_err();
    assert!(matches!(err, CoreError::UnitDecode { .. }));
    assert!(err.to_string().contains("m/bad.yaml"));
}

#[test]
fn test_walk_visits_every_file() {
    let units = walk(&fixtures(), "units").unwrap();
    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "audit",
            "default",
            "extras/audit",
            "posts",
            "refresh_grants",
            "schema",
            "threads",
            "users",
        ]
    );
}

#[test]
fn test_walk_stops_on_bad_file() {
    let tmp = scratch(&[
        ("m/a.yaml", "depends_on: [nothing]"),
        ("m/notes.txt", "not a unit"),
    ]);
    let err = walk(&DirSource::new(tmp.path()), "m").unwrap_err();
    assert!(matches!(err, CoreError::UnknownExtension { .. }));
}

#[test]
fn test_load_graph_includes_sentinel() {
    let graph = load_graph(&fixtures(), "units").unwrap();
    assert_eq!(graph.size(), 9);
    assert!(graph.validate().is_ok());
}

#[test]
fn test_load_graph_rejects_unit_named_nothing() {
    let tmp = scratch(&[("m/nothing.yaml", "depends_on: [nothing]")]);
    let err = load_graph(&DirSource::new(tmp.path()), "m").unwrap_err();
    assert!(matches!(err, CoreError::DuplicateUnit { .. }));
}

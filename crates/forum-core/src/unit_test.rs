use super::*;
use std::collections::HashSet;

fn name(s: &str) -> UnitName {
    UnitName::new(s)
}

#[test]
fn test_decode_full_unit_file() {
    let yaml = r#"
description: create users table
depends_on: [nothing, schema]
always_exec: false
type: migration
sql:
  postgres: CREATE TABLE users (id BIGINT PRIMARY KEY);
"#;
    let file: UnitFile = serde_yaml::from_str(yaml).unwrap();
    let unit = Unit::from_file(name("users"), file);

    assert_eq!(unit.name, "users");
    assert_eq!(unit.description, "create users table");
    assert_eq!(unit.depends_on, vec![name("nothing"), name("schema")]);
    assert_eq!(unit.kind, UnitKind::Migration);
    assert!(unit.postgres_sql().starts_with("CREATE TABLE users"));
    assert!(!unit.is_executed());
}

#[test]
fn test_type_defaults_to_migration() {
    let file: UnitFile = serde_yaml::from_str("depends_on: [nothing]").unwrap();
    assert_eq!(file.kind, UnitKind::Migration);
    assert!(file.sql.is_empty());
}

#[test]
fn test_target_kind_parses() {
    let file: UnitFile = serde_yaml::from_str("type: target\ndepends_on: [a, b]").unwrap();
    assert_eq!(file.kind, UnitKind::Target);
}

#[test]
fn test_unknown_key_rejected() {
    let result: Result<UnitFile, _> = serde_yaml::from_str("dependson: [a]");
    assert!(result.is_err());
}

#[test]
fn test_empty_dependency_name_rejected() {
    let result: Result<UnitFile, _> = serde_yaml::from_str("depends_on: ['']");
    assert!(result.is_err());
}

#[test]
fn test_depends_on_without_nothing_preserves_order() {
    let unit = Unit::migration(
        name("x"),
        vec![name("c"), name("nothing"), name("a"), name("c")],
        "",
    );
    let deps: Vec<&str> = unit.depends_on_without_nothing().map(|d| d.as_str()).collect();
    assert_eq!(deps, vec!["c", "a", "c"]);
}

#[test]
fn test_identity_is_name_only() {
    let a = Unit::migration(name("a"), vec![name("nothing")], "SELECT 1");
    let b = Unit::target(name("a"), vec![name("z")]);
    assert_eq!(a, b);

    let set: HashSet<Unit> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_is_recorded() {
    let m = Unit::migration(name("m"), vec![name("nothing")], "SELECT 1");
    assert!(m.is_recorded());
    assert!(!m.clone().with_always_exec().is_recorded());
    assert!(!Unit::target(name("t"), vec![name("m")]).is_recorded());
}

#[test]
fn test_sentinel_is_executed() {
    let s = Unit::sentinel();
    assert!(s.is_executed());
    assert!(s.name.is_nothing());
    assert_eq!(s.postgres_sql(), "");
}

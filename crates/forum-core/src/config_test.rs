use super::*;
use std::collections::HashMap;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.db.postgres.host, "localhost");
    assert_eq!(config.db.postgres.port, 5432);
    assert_eq!(config.db.postgres.sslmode, SslMode::Disable);
    assert_eq!(config.migrations.base, "migrations");
    assert_eq!(config.migrations.max_parallel, 8);
    assert_eq!(config.snowflake.instance_id, 0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
db:
  postgres:
    host: db.internal
    port: 6432
    user: forum
    pass: hunter2
    dbname: forum_prod
    sslmode: require
migrations:
  base: schema
  max_parallel: 2
snowflake:
  start_time: 1600000000
  instance_id: 12
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.db.postgres.host, "db.internal");
    assert_eq!(config.db.postgres.port, 6432);
    assert_eq!(config.db.postgres.pass, "hunter2");
    assert_eq!(config.db.postgres.sslmode, SslMode::Require);
    assert_eq!(config.migrations.base, "schema");
    assert_eq!(config.migrations.max_parallel, 2);
    assert_eq!(config.snowflake.start_time, 1_600_000_000);
    assert_eq!(config.snowflake.instance_id, 12);
}

#[test]
fn test_unknown_key_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("db:\n  mysql: {}\n");
    assert!(result.is_err());
}

#[test]
fn test_debug_redacts_password() {
    let mut config = Config::default();
    config.db.postgres.pass = "hunter2".to_string();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("hunter2"));
    assert_eq!(config.db.postgres.summary(), "postgres@localhost:5432/forum");
}

#[test]
fn test_apply_env_overrides() {
    let env: HashMap<String, String> = [
        ("FORUM_DB_POSTGRES_HOST", "pg"),
        ("FORUM_DB_POSTGRES_PORT", "15432"),
        ("FORUM_DB_POSTGRES_USER", "svc"),
        ("FORUM_DB_POSTGRES_PASS", "s3cret"),
        ("FORUM_DB_POSTGRES_DBNAME", "forum_test"),
        ("FORUM_DB_POSTGRES_SSLMODE", "Prefer"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let mut config = Config::default();
    config.apply_env(|k| env.get(k).cloned()).unwrap();

    let pg = &config.db.postgres;
    assert_eq!(pg.host, "pg");
    assert_eq!(pg.port, 15432);
    assert_eq!(pg.user, "svc");
    assert_eq!(pg.pass, "s3cret");
    assert_eq!(pg.dbname, "forum_test");
    assert_eq!(pg.sslmode, SslMode::Prefer);
}

#[test]
fn test_apply_env_bad_values() {
    let mut config = Config::default();
    let err = config
        .apply_env(|k| (k == "FORUM_DB_POSTGRES_PORT").then(|| "abc".to_string()))
        .unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));

    let err = config
        .apply_env(|k| (k == "FORUM_DB_POSTGRES_SSLMODE").then(|| "verify-full".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains("verify-full"));
}

#[test]
fn test_validate_rejects_zero_parallelism() {
    let mut config = Config::default();
    config.migrations.max_parallel = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_blank_host() {
    let mut config = Config::default();
    config.db.postgres.host = "  ".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("db.postgres.host"));
}

#[test]
fn test_load_missing_file() {
    let err = Config::load(Path::new("/nonexistent/forum.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_parse_error_mentions_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("forum.yml");
    std::fs::write(&path, "db: [").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParse { .. }));
    assert!(err.to_string().contains("forum.yml"));
}

// These tests read process environment variables and must run serially
use serial_test::serial;

#[test]
#[serial]
fn test_resolve_probes_directory() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("forum.yaml"),
        "migrations:\n  max_parallel: 3\n",
    )
    .unwrap();

    let config = Config::resolve(None, tmp.path()).unwrap();
    assert_eq!(config.migrations.max_parallel, 3);
}

#[test]
#[serial]
fn test_resolve_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = Config::resolve(None, tmp.path()).unwrap();
    assert_eq!(config.migrations.base, "migrations");
}

#[test]
#[serial]
fn test_resolve_explicit_missing_is_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("custom.yml");
    assert!(Config::resolve(Some(&missing), tmp.path()).is_err());
}

#[test]
#[serial]
fn test_resolve_applies_process_env() {
    let tmp = TempDir::new().unwrap();
    let original = std::env::var("FORUM_DB_POSTGRES_DBNAME").ok();
    std::env::set_var("FORUM_DB_POSTGRES_DBNAME", "from_env");

    let config = Config::resolve(None, tmp.path()).unwrap();
    assert_eq!(config.db.postgres.dbname, "from_env");

    match original {
        Some(v) => std::env::set_var("FORUM_DB_POSTGRES_DBNAME", v),
        None => std::env::remove_var("FORUM_DB_POSTGRES_DBNAME"),
    }
}

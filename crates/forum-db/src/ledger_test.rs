use super::*;
use crate::error::DbError;
use crate::test_utils::FakeDatabase;
use forum_core::UnitName;

fn unit(name: &str) -> Unit {
    Unit::migration(UnitName::new(name), vec![UnitName::nothing()], "SELECT 1")
}

fn ledger_over(db: &Arc<FakeDatabase>) -> Ledger {
    Ledger::new(Arc::clone(db) as Arc<dyn Database>)
}

#[tokio::test]
async fn test_bootstrap_creates_table_and_indexes_in_transaction() {
    let db = Arc::new(FakeDatabase::new());
    ledger_over(&db).bootstrap().await.unwrap();

    let statements = db.statements();
    assert_eq!(statements.first().map(String::as_str), Some("BEGIN"));
    assert_eq!(statements.last().map(String::as_str), Some("COMMIT"));
    assert!(statements
        .iter()
        .any(|s| s.contains("CREATE TABLE IF NOT EXISTS vape_migrations")));
    assert!(statements
        .iter()
        .any(|s| s.contains("vape_migrations_name_type_idx")));
    assert_eq!(db.commits(), 1);
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let db = Arc::new(FakeDatabase::new());
    let ledger = ledger_over(&db);
    ledger.bootstrap().await.unwrap();
    ledger.bootstrap().await.unwrap();
    assert_eq!(db.commits(), 2);
    assert!(!db.in_transaction());
}

#[tokio::test]
async fn test_bootstrap_fails_when_ping_fails() {
    let db = Arc::new(FakeDatabase::new().fail_ping());
    let err = ledger_over(&db).bootstrap().await.unwrap_err();
    assert!(matches!(err, DbError::ConnectionError(_)));
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn test_bootstrap_rolls_back_on_error() {
    let db = Arc::new(FakeDatabase::new().fail_on("CREATE INDEX"));
    assert!(ledger_over(&db).bootstrap().await.is_err());
    assert_eq!(db.rollbacks(), 1);
    assert_eq!(db.commits(), 0);
    assert!(!db.in_transaction());
}

#[tokio::test]
async fn test_list_applied() {
    let db = Arc::new(FakeDatabase::new().with_applied(["users", "schema"]));
    let mut applied = ledger_over(&db).list_applied().await.unwrap();
    applied.sort();
    assert_eq!(applied, vec!["schema", "users"]);
}

#[tokio::test]
async fn test_mark_applied_records_migrations() {
    let db = Arc::new(FakeDatabase::new());
    let ledger = ledger_over(&db);
    assert!(ledger.mark_applied(&unit("users")).await.unwrap());
    assert_eq!(db.ledger(), vec!["users"]);
}

#[tokio::test]
async fn test_mark_applied_skips_targets_and_always_exec() {
    let db = Arc::new(FakeDatabase::new());
    let ledger = ledger_over(&db);

    let target = Unit::target(UnitName::new("default"), vec![UnitName::new("users")]);
    assert!(!ledger.mark_applied(&target).await.unwrap());
    assert!(!ledger.mark_applied(&unit("grants").with_always_exec()).await.unwrap());

    assert!(db.ledger().is_empty());
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn test_mark_applied_twice_conflicts() {
    let db = Arc::new(FakeDatabase::new());
    let ledger = ledger_over(&db);
    ledger.mark_applied(&unit("users")).await.unwrap();
    let err = ledger.mark_applied(&unit("users")).await.unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation(_)));
}

#[tokio::test]
async fn test_marks_vanish_on_rollback() {
    let db = Arc::new(FakeDatabase::new());
    let ledger = ledger_over(&db);
    db.begin().await.unwrap();
    ledger.mark_applied(&unit("users")).await.unwrap();
    assert_eq!(ledger.list_applied().await.unwrap(), vec!["users"]);
    db.rollback().await.unwrap();
    assert!(ledger.list_applied().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_aborted_session_rejects_until_rollback() {
    let db = Arc::new(FakeDatabase::new().fail_on("boom").fail_aborts_session());
    let ledger = ledger_over(&db);
    db.begin().await.unwrap();

    let err = db.execute_batch("SELECT boom").await.unwrap_err();
    assert!(matches!(err, DbError::ExecutionError(_)));
    assert!(!err.is_transaction_aborted());

    let err = ledger.mark_applied(&unit("users")).await.unwrap_err();
    assert!(err.is_transaction_aborted());
    assert!(err.to_string().contains("[D006]"));

    db.rollback().await.unwrap();
    assert!(ledger.mark_applied(&unit("users")).await.unwrap());
    assert_eq!(db.ledger(), vec!["users"]);
}

//! Runner tests against unit trees loaded from disk

use forum_core::DirSource;
use forum_db::test_utils::FakeDatabase;
use forum_db::Database;
use forum_migrate::{MigrateError, Runner, DEFAULT_TARGET};
use std::path::PathBuf;
use std::sync::Arc;

fn fixtures() -> DirSource {
    DirSource::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

fn runner(db: &Arc<FakeDatabase>) -> Runner {
    Runner::new(Arc::clone(db) as Arc<dyn Database>)
}

#[tokio::test]
async fn test_board_tree_applies_default_target() {
    let db = Arc::new(FakeDatabase::new());
    let report = runner(&db)
        .run(&fixtures(), "board", DEFAULT_TARGET)
        .await
        .unwrap();

    assert_eq!(
        report.rounds,
        vec![
            vec!["schema".to_string()],
            vec!["members/accounts".to_string()],
            vec!["boards".to_string(), "members/roles".to_string()],
            vec!["default".to_string()],
        ]
    );
    assert_eq!(db.ledger(), vec!["boards", "members/accounts", "schema"]);
    assert_eq!(db.commits(), 2);
}

#[tokio::test]
async fn test_board_tree_second_run_only_reapplies_always_exec() {
    let db = Arc::new(FakeDatabase::new());
    runner(&db)
        .run(&fixtures(), "board", DEFAULT_TARGET)
        .await
        .unwrap();

    let report = runner(&db)
        .run(&fixtures(), "board", DEFAULT_TARGET)
        .await
        .unwrap();
    assert_eq!(report.already_applied, 3);
    assert_eq!(report.executed_sql, 1);
    assert_eq!(report.recorded, 0);
    assert_eq!(
        report.rounds,
        vec![vec!["members/roles".to_string()], vec!["default".to_string()]]
    );
}

#[tokio::test]
async fn test_board_tree_plan() {
    let db = Arc::new(FakeDatabase::new().with_applied(["schema"]));
    let plan = runner(&db)
        .plan(&fixtures(), "board", DEFAULT_TARGET)
        .await
        .unwrap();

    assert_eq!(plan.already_applied, 1);
    assert_eq!(plan.rounds.len(), 3);
    assert_eq!(db.ledger(), vec!["schema"]);
}

#[tokio::test]
async fn test_cyclic_tree_is_stuck() {
    let db = Arc::new(FakeDatabase::new());
    let err = runner(&db)
        .run(&fixtures(), "cyclic", DEFAULT_TARGET)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::Stuck { .. }));
    assert!(err.to_string().contains("left -> right -> left"));
    assert!(!db.statements().iter().any(|s| s.starts_with("SELECT '")));
}

#[tokio::test]
async fn test_missing_base_has_no_target() {
    let db = Arc::new(FakeDatabase::new());
    let err = runner(&db)
        .run(&fixtures(), "absent", DEFAULT_TARGET)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Subgraph { ref target, .. } if target == "default"));
}

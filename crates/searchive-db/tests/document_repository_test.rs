//! Integration tests for document metadata persistence.
//!
//! Require a live PostgreSQL (`DATABASE_URL`); run with `cargo test -- --ignored`.

use searchive_core::{DocumentRepository, Error, ErrorKind, NewDocument};
use searchive_db::test_fixtures::{connect_test_database, create_test_user, delete_test_user};
use uuid::Uuid;

fn new_document(user_id: i64, name: &str) -> NewDocument {
    NewDocument {
        user_id,
        original_filename: name.to_string(),
        storage_path: format!("{user_id}/{}.pdf", Uuid::new_v4()),
        file_type: "application/pdf".to_string(),
        file_size_kb: 12,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_insert_and_find_scoped_by_owner() {
    let db = connect_test_database().await;
    let owner = create_test_user(&db.pool).await;
    let other = create_test_user(&db.pool).await;

    let doc = db
        .documents
        .insert(new_document(owner, "report.pdf"))
        .await
        .unwrap();
    assert_eq!(doc.original_filename, "report.pdf");
    assert_eq!(doc.file_size_kb, 12);

    let found = db.documents.find_for_owner(doc.document_id, owner).await.unwrap();
    assert_eq!(found.as_ref().map(|d| d.document_id), Some(doc.document_id));

    let hidden = db.documents.find_for_owner(doc.document_id, other).await.unwrap();
    assert!(hidden.is_none());

    delete_test_user(&db.pool, owner).await;
    delete_test_user(&db.pool, other).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_list_for_owner_newest_first() {
    let db = connect_test_database().await;
    let owner = create_test_user(&db.pool).await;

    let first = db.documents.insert(new_document(owner, "a.pdf")).await.unwrap();
    let second = db.documents.insert(new_document(owner, "b.pdf")).await.unwrap();

    let listed = db.documents.list_for_owner(owner).await.unwrap();
    let ids: Vec<i64> = listed.iter().map(|d| d.document_id).collect();
    assert_eq!(ids, vec![second.document_id, first.document_id]);

    delete_test_user(&db.pool, owner).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_storage_path_is_conflict() {
    let db = connect_test_database().await;
    let owner = create_test_user(&db.pool).await;

    let doc = new_document(owner, "dup.pdf");
    db.documents.insert(doc.clone()).await.unwrap();
    let err = db.documents.insert(doc).await.unwrap_err();

    assert!(matches!(err, Error::Database(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    delete_test_user(&db.pool, owner).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_delete_missing_returns_false() {
    let db = connect_test_database().await;
    assert!(!db.documents.delete(i64::MAX).await.unwrap());
}

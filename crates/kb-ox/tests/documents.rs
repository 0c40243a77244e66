use kb_ox::{DocumentStore, KnowledgeBase, KnowledgeBaseError, Severity};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

fn client(server: &MockServer) -> KnowledgeBase {
    KnowledgeBase::builder().base_url(server.uri()).build()
}

async fn mount_listing(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/documents/list"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn listing_is_parsed_in_backend_order() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([
            {"id": "7", "fileName": "report.pdf", "uploadDate": "2024-05-01T09:30:00Z", "fileSize": 2_621_440},
            {"fileName": "notes.txt", "uploadDate": "2024-05-02 10:00:00"}
        ])),
    )
    .await;

    let documents = client(&server).list_documents().await.unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].file_name, "report.pdf");
    assert_eq!(documents[0].size_mb().as_deref(), Some("2.50"));
    assert_eq!(documents[1].file_name, "notes.txt");
    assert_eq!(documents[1].size_mb(), None);
    assert!(documents[1].id.is_none());
}

#[tokio::test]
async fn numeric_ids_do_not_spoil_the_listing() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "fileName": "a.pdf", "uploadDate": "2024-05-01T09:30:00"},
            {"id": "2", "fileName": "b.pdf", "uploadDate": "2024-05-02T09:30:00"}
        ])),
    )
    .await;

    let store = DocumentStore::new(client(&server));
    let snapshot = store.refresh().await;
    assert!(snapshot.available);
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.documents[0].id.as_deref(), Some("1"));
    assert_eq!(snapshot.documents[0].key(0), "1");
    assert_eq!(snapshot.documents[1].key(1), "2");
}

#[tokio::test]
async fn null_upload_date_keeps_the_record() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "fileName": "a.pdf", "uploadDate": "2024-05-01T09:30:00"},
            {"id": "2", "fileName": "b.pdf", "uploadDate": null}
        ])),
    )
    .await;

    let store = DocumentStore::new(client(&server));
    let snapshot = store.refresh().await;
    assert!(snapshot.available);
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.contains("a.pdf"));
    assert!(snapshot.contains("b.pdf"));
    assert_eq!(snapshot.documents[1].upload_date, "");
    assert!(snapshot.documents[1].uploaded_at().is_none());
}

#[tokio::test]
async fn listing_ignores_status_code() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ResponseTemplate::new(400).set_body_json(json!([
            {"id": "1", "fileName": "still-here.docx", "uploadDate": "2024-01-01"}
        ])),
    )
    .await;

    let store = DocumentStore::new(client(&server));
    let snapshot = store.refresh().await;
    assert!(snapshot.available);
    assert!(snapshot.contains("still-here.docx"));
}

#[tokio::test]
async fn null_listing_means_no_documents() {
    let server = MockServer::start().await;
    mount_listing(&server, ResponseTemplate::new(200).set_body_string("null")).await;

    let store = DocumentStore::new(client(&server));
    let snapshot = store.refresh().await;
    assert!(snapshot.available);
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn unreadable_listing_becomes_unavailable_empty_snapshot() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        ResponseTemplate::new(500).set_body_string("<html>Internal Server Error</html>"),
    )
    .await;

    let kb = client(&server);
    let err = kb.list_documents().await.unwrap_err();
    assert!(matches!(err, KnowledgeBaseError::ListingUnavailable(_)));

    let store = DocumentStore::new(kb);
    let mut updates = store.subscribe();
    let snapshot = store.refresh().await;
    assert!(!snapshot.available);
    assert!(snapshot.is_empty());
    assert!(updates.has_changed().unwrap());
    assert!(!updates.borrow_and_update().available);
}

#[tokio::test]
async fn unreachable_backend_becomes_unavailable_empty_snapshot() {
    // Nothing listens on the discard port.
    let store = DocumentStore::new(KnowledgeBase::builder().base_url("http://127.0.0.1:9").build());
    let snapshot = store.refresh().await;
    assert!(!snapshot.available);
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn delete_sends_name_even_when_not_listed() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/documents/delete"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "ghost.pdf"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
        .expect(1)
        .mount(&server)
        .await;
    mount_listing(&server, ResponseTemplate::new(200).set_body_json(json!([]))).await;

    let store = DocumentStore::new(client(&server));
    assert!(!store.snapshot().contains("ghost.pdf"));
    store.delete("ghost.pdf").await.unwrap();
}

#[tokio::test]
async fn successful_delete_refreshes_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/documents/delete"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "2", "fileName": "keep.txt", "uploadDate": "2024-03-03"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = DocumentStore::new(client(&server));
    let notice = store.delete_with_notice("gone.txt").await;
    assert_eq!(notice.severity, Severity::Success);
    assert_eq!(notice.message, "document \"gone.txt\" deleted");

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains("keep.txt"));
}

#[tokio::test]
async fn rejected_delete_keeps_backend_text_and_skips_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/documents/delete"))
        .respond_with(ResponseTemplate::new(404).set_body_string("文档不存在"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store = DocumentStore::new(client(&server));
    let err = store.delete("missing.pdf").await.unwrap_err();
    assert!(matches!(&err, KnowledgeBaseError::DeleteRejected(body) if body == "文档不存在"));

    let notice = store.delete_with_notice("missing.pdf").await;
    assert_eq!(notice.severity, Severity::Error);
    assert_eq!(notice.message, "delete failed: 文档不存在");
}

#[test]
fn builder_defaults_to_local_backend() {
    let kb = KnowledgeBase::new();
    assert_eq!(kb.base_url(), "http://localhost:8081");

    let custom = KnowledgeBase::builder()
        .base_url("http://kb.internal:9000")
        .user_agent("kb-ox-tests")
        .build();
    assert_eq!(custom.base_url(), "http://kb.internal:9000");

    let debug = format!("{custom:?}");
    assert!(debug.contains("kb.internal"));
}

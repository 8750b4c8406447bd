//! End-to-end HTTP tests against the `/api` surface, driven with `reqwest`
//! over a real (ephemeral-port) axum server backed by the in-memory store
//! double, mirroring scenarios S1-S4 from the ingestion/deindex/query spec.

use std::time::Duration;

use docaudit_server::state::AppState;

async fn spawn_server() -> String {
    let state = AppState::in_memory();
    let router = docaudit_server::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn docx_bytes(paragraphs: &[(&str, Option<&str>)]) -> Vec<u8> {
    use std::io::Write;

    let mut body = String::new();
    for (text, style) in paragraphs {
        body.push_str("<w:p>");
        if let Some(style) = style {
            body.push_str(&format!(r#"<w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#));
        }
        body.push_str(&format!("<w:r><w:t>{text}</w:t></w:r>"));
        body.push_str("</w:p>");
    }
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let mut buf = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut buf);
        let mut zip = zip::ZipWriter::new(cursor);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

async fn upload(base: &str, bytes: Vec<u8>) -> String {
    let client = reqwest::Client::new();
    let part = reqwest::multipart::Part::bytes(bytes).file_name("doc.docx");
    let form = reqwest::multipart::Form::new().part("file", part);
    let resp = client
        .post(format!("{base}/api/sources"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "indexing");
    body["id"].as_str().unwrap().to_string()
}

async fn wait_for_indexed(base: &str, id: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        let resp = client
            .get(format!("{base}/api/sources/{id}"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        if body["status"] == "indexed" {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("source {id} never became indexed");
}

/// S1 — single ingest then query.
#[tokio::test]
async fn single_ingest_then_query_returns_the_passage_scoped_to_its_source() {
    let base = spawn_server().await;
    let bytes = docx_bytes(&[
        ("Intro", Some("Heading 1")),
        ("Active content has to be disabled.", None),
    ]);
    let sid = upload(&base, bytes).await;
    wait_for_indexed(&base, &sid).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{base}/api/query"))
        .query(&[
            ("content", "Disable active content"),
            ("top_k", "1"),
            ("source_ids", sid.as_str()),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let results: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert!(results[0]["content"].as_str().unwrap().contains("Active content"));
    assert_eq!(results[0]["locations"][0]["id"], sid);
    assert_eq!(results[0]["locations"][0]["path"][0], "Intro");
}

/// S3 — partial deindex: deleting one of two sources sharing a passage
/// leaves the passage visible (pruned) under the surviving source only.
#[tokio::test]
async fn deleting_one_of_two_sharing_sources_prunes_locations_to_the_survivor() {
    let base = spawn_server().await;
    let bytes = docx_bytes(&[("Intro", Some("Heading 1")), ("Shared passage body.", None)]);

    let s1 = upload(&base, bytes.clone()).await;
    wait_for_indexed(&base, &s1).await;
    let s2 = upload(&base, bytes).await;
    wait_for_indexed(&base, &s2).await;

    let client = reqwest::Client::new();
    let resp = client
        .delete(format!("{base}/api/sources/{s1}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{base}/api/query"))
        .query(&[("content", "shared passage"), ("top_k", "5"), ("source_ids", s2.as_str())])
        .send()
        .await
        .unwrap();
    let results: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["locations"].as_array().unwrap().len(), 1);
    assert_eq!(results[0]["locations"][0]["id"], s2);

    let resp = client
        .get(format!("{base}/api/query"))
        .query(&[("content", "shared passage"), ("top_k", "5"), ("source_ids", s1.as_str())])
        .send()
        .await
        .unwrap();
    let results: serde_json::Value = resp.json().await.unwrap();
    assert!(results.as_array().unwrap().is_empty());
}

/// S6 — a file that fails to parse still yields a 201 and an eventual
/// `not_found` (no passages were ever written for it).
#[tokio::test]
async fn malformed_upload_completes_as_not_found_rather_than_failing_the_request() {
    let base = spawn_server().await;
    let sid = upload(&base, b"not a docx".to_vec()).await;

    let client = reqwest::Client::new();
    for _ in 0..50 {
        let resp = client
            .get(format!("{base}/api/sources/{sid}"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        if body["status"] != "indexing" && body["status"] != "waiting" {
            assert_eq!(body["status"], "not_found");
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("source {sid} never settled");
}

#[tokio::test]
async fn query_without_content_is_a_bad_request() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{base}/api/query"))
        .query(&[("top_k", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn list_statuses_reports_every_requested_id() {
    let base = spawn_server().await;
    let bytes = docx_bytes(&[("Intro", Some("Heading 1")), ("Body text.", None)]);
    let sid = upload(&base, bytes).await;
    wait_for_indexed(&base, &sid).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{base}/api/sources"))
        .query(&[("source_ids", format!("{sid},unknown-id").as_str())])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let statuses: std::collections::HashMap<&str, &str> = entries
        .iter()
        .map(|e| (e["id"].as_str().unwrap(), e["status"].as_str().unwrap()))
        .collect();
    assert_eq!(statuses[sid.as_str()], "indexed");
    assert_eq!(statuses["unknown-id"], "not_found");
}

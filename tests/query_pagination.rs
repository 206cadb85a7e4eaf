//! Tests for paginated JQL search
//!
//! Offsets must advance by what the server actually returned, and a
//! single-page fetch must stop after the first call.

mod test_utils;

use jql_explorer::explorer::query::{fetch_all, PAGE_SIZE};
use pretty_assertions::assert_eq;
use test_utils::{issue, keys, site, subtask, FakeJira};

fn numbered(count: usize) -> Vec<jql_explorer::data::Issue> {
    (1..=count).map(|n| issue(&format!("PROJ-{}", n))).collect()
}

#[tokio::test]
async fn test_offsets_follow_server_page_cap() {
    let client = FakeJira::new()
        .with_results("project = PROJ", numbered(100))
        .with_page_cap(40);

    let issues = fetch_all(&client, &site(), "project = PROJ", true)
        .await
        .unwrap();

    assert_eq!(issues.len(), 100);
    let offsets: Vec<usize> = client.search_calls().iter().map(|c| c.start_at).collect();
    assert_eq!(offsets, vec![0, 40, 80]);
    assert_eq!(issues[99].key, "PROJ-100");
}

#[tokio::test]
async fn test_single_page_when_not_fetching_all() {
    let client = FakeJira::new().with_results("project = PROJ", numbered(250));

    let issues = fetch_all(&client, &site(), "project = PROJ", false)
        .await
        .unwrap();

    assert_eq!(issues.len(), PAGE_SIZE);
    let calls = client.search_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].start_at, 0);
    assert_eq!(calls[0].max_results, PAGE_SIZE);
}

#[tokio::test]
async fn test_fetch_all_reads_every_page() {
    let client = FakeJira::new().with_results("project = PROJ", numbered(250));

    let issues = fetch_all(&client, &site(), "project = PROJ", true)
        .await
        .unwrap();

    assert_eq!(issues.len(), 250);
    let offsets: Vec<usize> = client.search_calls().iter().map(|c| c.start_at).collect();
    assert_eq!(offsets, vec![0, 100, 200]);
}

#[tokio::test]
async fn test_empty_page_stops_loop() {
    // Server claims 500 matches but only ever returns 10
    let client = FakeJira::new()
        .with_results("project = PROJ", numbered(10))
        .with_total(500);

    let issues = fetch_all(&client, &site(), "project = PROJ", true)
        .await
        .unwrap();

    assert_eq!(issues.len(), 10);
    let offsets: Vec<usize> = client.search_calls().iter().map(|c| c.start_at).collect();
    assert_eq!(offsets, vec![0, 10]);
}

#[tokio::test]
async fn test_no_results() {
    let client = FakeJira::new().with_results("project = EMPTY", Vec::new());

    let issues = fetch_all(&client, &site(), "project = EMPTY", true)
        .await
        .unwrap();

    assert!(issues.is_empty());
    assert_eq!(client.search_calls().len(), 1);
}

#[tokio::test]
async fn test_embedded_subtasks_are_cleared() {
    let mut parent = issue("PROJ-1");
    parent.subtasks = vec![subtask("PROJ-2", "PROJ-1")];
    let client = FakeJira::new().with_results("project = PROJ", vec![parent]);

    let issues = fetch_all(&client, &site(), "project = PROJ", false)
        .await
        .unwrap();

    assert_eq!(keys(&issues), vec!["PROJ-1"]);
    assert!(issues[0].subtasks.is_empty());
}

#[tokio::test]
async fn test_requests_epic_fields() {
    let client = FakeJira::new().with_results("project = PROJ", numbered(1));

    fetch_all(&client, &site(), "project = PROJ", false)
        .await
        .unwrap();

    let fields = &client.search_calls()[0].fields;
    assert!(fields.contains(&"customfield_10014".to_string()));
    assert!(fields.contains(&"customfield_10011".to_string()));
    assert!(fields.contains(&"created".to_string()));
}

#[tokio::test]
async fn test_search_error_propagates() {
    let client = FakeJira::new()
        .with_results("project = BAD", Vec::new())
        .with_failing_query("project = BAD");

    let result = fetch_all(&client, &site(), "project = BAD", true).await;

    assert!(result.is_err());
    assert_eq!(client.search_calls().len(), 1);
}

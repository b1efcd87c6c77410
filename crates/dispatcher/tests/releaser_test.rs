mod common;

use std::sync::Arc;

use article_releases_core::{MessageQueueConfig, RemoteFunction, RuntimeSession};
use article_releases_dispatcher::{HeaderReleaser, HEADER_RELEASE_ERROR};
use common::*;
use serde_json::json;

fn create_releaser(
    requester: &Arc<MockSessionRequester>,
    reader: &Arc<MockHeaderReader>,
) -> HeaderReleaser {
    HeaderReleaser::new(requester.clone(), reader.clone(), TEST_SQL_QUEUE)
}

#[tokio::test]
async fn test_release_header_success() {
    let requester = shared(MockSessionRequester::replying(json!({"result": "success"})));
    let reader = shared(MockHeaderReader::found(create_test_header()));
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", Some(true));
    let mut output = create_test_output(&input);

    let header = releaser
        .release_header(&input, input.session(), &mut output)
        .await
        .expect("header should be released");

    assert_eq!(header.article, TEST_ARTICLE);
    assert_eq!(header.is_released, Some(true));
    assert_eq!(output.sql_update_result, None);
    assert!(output.sql_update_error.is_empty());
    assert_eq!(requester.acked_tags(), vec![1]);
}

#[tokio::test]
async fn test_release_header_sends_session_envelope() {
    let requester = shared(MockSessionRequester::replying(json!({"result": "success"})));
    let reader = shared(MockHeaderReader::found(create_test_header()));
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", Some(true));
    let mut output = create_test_output(&input);
    releaser
        .release_header(&input, input.session(), &mut output)
        .await;

    let sent = requester.sent_requests();
    assert_eq!(sent.len(), 1);

    let (queue, request) = &sent[0];
    assert_eq!(queue, TEST_SQL_QUEUE);
    assert_eq!(request.function, RemoteFunction::ArticleHeader);
    assert_eq!(request.runtime_session_id, RuntimeSession::new(TEST_SESSION_ID));
    assert_eq!(request.message["Article"], json!(TEST_ARTICLE));
    assert_eq!(request.message["IsReleased"], json!(true));

    let envelope = serde_json::to_value(request).unwrap();
    let mut keys: Vec<_> = envelope.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["function", "message", "runtime_session_id"]);
}

#[tokio::test]
async fn test_release_header_copies_unset_release_flag() {
    let mut stored = create_test_header();
    stored.is_released = Some(true);

    let requester = shared(MockSessionRequester::replying(json!({"result": "success"})));
    let reader = shared(MockHeaderReader::found(stored));
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", None);
    let mut output = create_test_output(&input);
    let header = releaser
        .release_header(&input, input.session(), &mut output)
        .await
        .unwrap();

    assert_eq!(header.is_released, None);
}

#[tokio::test]
async fn test_release_header_rejected_by_worker() {
    let requester = shared(MockSessionRequester::replying(json!({"result": "failed"})));
    let reader = shared(MockHeaderReader::found(create_test_header()));
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", Some(true));
    let mut output = create_test_output(&input);
    let header = releaser
        .release_header(&input, input.session(), &mut output)
        .await;

    assert!(header.is_none());
    assert_eq!(output.sql_update_result, Some(false));
    assert_eq!(output.sql_update_error, HEADER_RELEASE_ERROR);
    // 被拒绝的响应同样需要确认
    assert_eq!(requester.acked_tags(), vec![1]);
}

#[tokio::test]
async fn test_release_header_reply_without_result_is_rejection() {
    let requester = shared(MockSessionRequester::replying(json!({"message": "ok"})));
    let reader = shared(MockHeaderReader::found(create_test_header()));
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", Some(true));
    let mut output = create_test_output(&input);
    let header = releaser
        .release_header(&input, input.session(), &mut output)
        .await;

    assert!(header.is_none());
    assert_eq!(output.sql_update_result, Some(false));
}

#[tokio::test]
async fn test_release_header_missing_is_silent() {
    let requester = shared(MockSessionRequester::replying(json!({"result": "success"})));
    let reader = shared(MockHeaderReader::missing());
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", Some(true));
    let mut output = create_test_output(&input);
    let header = releaser
        .release_header(&input, input.session(), &mut output)
        .await;

    assert!(header.is_none());
    assert_eq!(output.sql_update_result, None);
    assert!(output.sql_update_error.is_empty());
    assert!(requester.sent_requests().is_empty());
}

#[tokio::test]
async fn test_release_header_read_error_is_silent() {
    let requester = shared(MockSessionRequester::replying(json!({"result": "success"})));
    let reader = shared(MockHeaderReader::failing());
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", Some(true));
    let mut output = create_test_output(&input);
    let header = releaser
        .release_header(&input, input.session(), &mut output)
        .await;

    assert!(header.is_none());
    assert_eq!(output.sql_update_result, None);
    assert!(requester.sent_requests().is_empty());
}

#[tokio::test]
async fn test_release_header_transport_error_sets_no_status() {
    let requester = shared(MockSessionRequester::failing());
    let reader = shared(MockHeaderReader::found(create_test_header()));
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", Some(true));
    let mut output = create_test_output(&input);
    let header = releaser
        .release_header(&input, input.session(), &mut output)
        .await;

    assert!(header.is_none());
    assert_eq!(output.sql_update_result, None);
    assert!(output.sql_update_error.is_empty());
    assert_eq!(requester.sent_requests().len(), 1);
    assert!(requester.acked_tags().is_empty());
}

#[tokio::test]
async fn test_release_header_is_idempotent() {
    let requester = shared(MockSessionRequester::replying(json!({"result": "success"})));
    let reader = shared(MockHeaderReader::found(create_test_header()));
    let releaser = create_releaser(&requester, &reader);

    let input = create_test_request("releases", Some(true));

    let mut first_output = create_test_output(&input);
    let first = releaser
        .release_header(&input, input.session(), &mut first_output)
        .await;
    let mut second_output = create_test_output(&input);
    let second = releaser
        .release_header(&input, input.session(), &mut second_output)
        .await;

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(first_output.sql_update_result, second_output.sql_update_result);
}

#[test]
fn test_releaser_from_config_uses_first_sql_queue() {
    let config = MessageQueueConfig {
        queue_to_sql: vec!["primary".to_string(), "secondary".to_string()],
        ..Default::default()
    };
    let releaser = HeaderReleaser::from_config(
        shared(MockSessionRequester::failing()),
        shared(MockHeaderReader::missing()),
        &config,
    )
    .unwrap();
    assert_eq!(releaser.sql_queue(), "primary");

    let config = MessageQueueConfig {
        queue_to_sql: Vec::new(),
        ..Default::default()
    };
    assert!(HeaderReleaser::from_config(
        shared(MockSessionRequester::failing()),
        shared(MockHeaderReader::missing()),
        &config,
    )
    .is_err());
}

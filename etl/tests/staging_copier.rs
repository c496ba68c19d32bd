use std::time::Duration;

use chrono::NaiveDateTime;
use config::shared::UpstreamConfig;
use etl::error::ErrorKind;
use etl::staging::MemoryStaging;
use etl::staging::copier::{CopyRequest, StagingCopier};
use etl::staging::http::HttpUpstreamProvider;
use etl::staging::upstream::{PageRequest, SortDirection, TimeWindow, UpstreamProvider};
use etl::test_utils::upstream::{MemoryUpstream, courier_json};
use etl::types::TableName;
use secrecy::SecretString;
use serde_json::json;
use telemetry::init_test_tracing;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn couriers_request(page_size: usize) -> CopyRequest {
    CopyRequest {
        collection: "couriers".to_owned(),
        sort_field: "_id".to_owned(),
        sort_direction: SortDirection::Asc,
        window: TimeWindow::trailing_days(7),
        page_size,
        target: TableName::new("stg", "deliverysystem_couriers"),
    }
}

fn timestamp(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn upstream_config(api_url: String) -> UpstreamConfig {
    UpstreamConfig {
        api_url,
        nickname: "syncer".to_owned(),
        cohort: "7".to_owned(),
        api_key: SecretString::new("secret-key".to_owned()),
        window_days: 7,
        page_size: 2,
        request_timeout_secs: 5,
    }
}

#[tokio::test]
async fn copies_every_page_until_an_empty_one() {
    init_test_tracing();

    let upstream = MemoryUpstream::with_page_sizes(&[50, 50, 0]);
    let staging = MemoryStaging::new();
    let copier = StagingCopier::new(upstream.clone(), staging.clone());
    let request = couriers_request(50);

    let copied = copier.copy(&request).await.unwrap();

    assert_eq!(copied, 100);
    let offsets: Vec<_> = upstream
        .requests()
        .await
        .iter()
        .map(|request| request.offset)
        .collect();
    assert_eq!(offsets, [0, 50, 100]);
    assert!(upstream.requests().await.iter().all(|r| r.limit == 50));

    let records = staging.records(&request.target).await;
    assert_eq!(records.len(), 100);
    assert_eq!(records[0].natural_key, format!("{:024x}", 1));
    assert_eq!(records[0].payload["name"], "Courier 1");
}

#[tokio::test]
async fn recopying_appends_instead_of_deduplicating() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let request = couriers_request(10);

    for _ in 0..2 {
        let copier = StagingCopier::new(MemoryUpstream::with_page_sizes(&[3]), staging.clone());
        assert_eq!(copier.copy(&request).await.unwrap(), 3);
    }

    let records = staging.records(&request.target).await;
    assert_eq!(records.len(), 6);
    assert_eq!(records[0].natural_key, records[3].natural_key);
}

#[tokio::test]
async fn http_provider_sends_credentials_and_decodes_object_ids() {
    init_test_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/couriers"))
        .and(header("X-Nickname", "syncer"))
        .and(header("X-Cohort", "7"))
        .and(header("X-API-KEY", "secret-key"))
        .and(query_param("sort_field", "_id"))
        .and(query_param("sort_direction", "asc"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            courier_json(1),
            courier_json(2)
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/couriers"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpUpstreamProvider::new(&upstream_config(server.uri())).unwrap();
    let staging = MemoryStaging::new();
    let copier = StagingCopier::new(provider, staging.clone());
    let request = couriers_request(2);

    assert_eq!(copier.copy(&request).await.unwrap(), 2);

    let records = staging.records(&request.target).await;
    assert_eq!(records[1].natural_key, format!("{:024x}", 2));
    assert_eq!(
        records[1].payload,
        json!({"_id": format!("{:024x}", 2), "name": "Courier 2"})
    );
}

#[tokio::test]
async fn http_provider_keeps_the_window_fixed_across_pages() {
    init_test_tracing();

    let server = MockServer::start().await;
    // The first page is slow enough for the clock to move past a second.
    Mock::given(method("GET"))
        .and(path("/couriers"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([courier_json(1), courier_json(2)]))
                .set_delay(Duration::from_millis(1100)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/couriers"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([courier_json(3)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/couriers"))
        .and(query_param("offset", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let provider = HttpUpstreamProvider::new(&upstream_config(server.uri())).unwrap();
    let copier = StagingCopier::new(provider, MemoryStaging::new());
    let window = TimeWindow {
        from: timestamp("2022-09-07 10:00:00"),
        to: timestamp("2022-09-14 10:00:00"),
    };
    let request = CopyRequest {
        window,
        ..couriers_request(2)
    };

    assert_eq!(copier.copy(&request).await.unwrap(), 3);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
    for request in received {
        let query: Vec<_> = request.url.query_pairs().into_owned().collect();
        assert!(query.contains(&("from".to_owned(), "2022-09-07 10:00:00".to_owned())));
        assert!(query.contains(&("to".to_owned(), "2022-09-14 10:00:00".to_owned())));
    }
}

#[tokio::test]
async fn http_provider_surfaces_rejected_requests() {
    init_test_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/couriers"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = HttpUpstreamProvider::new(&upstream_config(server.uri())).unwrap();
    let request = PageRequest {
        collection: "couriers".to_owned(),
        sort_field: "_id".to_owned(),
        sort_direction: SortDirection::Asc,
        window: TimeWindow::trailing_days(7),
        limit: 2,
        offset: 0,
    };

    let err = provider.fetch_page(&request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamRequestFailed);
    assert!(err.detail().unwrap().contains("401"));
}

#[tokio::test]
async fn http_provider_rejects_non_object_documents() {
    init_test_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/couriers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
        .mount(&server)
        .await;

    let provider = HttpUpstreamProvider::new(&upstream_config(server.uri())).unwrap();
    let copier = StagingCopier::new(provider, MemoryStaging::new());

    let err = copier.copy(&couriers_request(2)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidPayload);
}

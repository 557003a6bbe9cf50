use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::json;
use tokio::sync::Mutex;

use amp_source::catalog::ConnectionStatus;
use amp_source::config::ConnectorConfig;
use amp_source::error::AmpError;
use amp_source::source::AmpSource;
use amp_source::transport::{HttpGetResult, HttpTransport};

const METRIC_NAMES_PATH: &str = "/api/v1/label/__name__/values";
const RULES_PATH: &str = "/api/v1/rules";

fn test_config() -> ConnectorConfig {
    ConnectorConfig::from_json_str(include_str!("resources/config_valid.json")).unwrap()
}

/// Transport stub serving canned responses keyed by URL path suffix.
struct MockHttp {
    responses: HashMap<&'static str, (u16, String)>,
    fail_with: Option<String>,
    requests: Mutex<Vec<(String, HeaderMap)>>,
}

impl MockHttp {
    fn with_responses(responses: Vec<(&'static str, u16, serde_json::Value)>) -> Arc<Self> {
        Arc::new(Self {
            responses: responses
                .into_iter()
                .map(|(path, status, body)| (path, (status, body.to_string())))
                .collect(),
            fail_with: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn with_raw_response(path: &'static str, status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            responses: HashMap::from([(path, (status, body.to_string()))]),
            fail_with: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            responses: HashMap::new(),
            fail_with: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl HttpTransport for MockHttp {
    async fn get(&self, url: &str, headers: HeaderMap) -> amp_source::error::Result<HttpGetResult> {
        self.requests.lock().await.push((url.to_string(), headers));
        if let Some(message) = &self.fail_with {
            return Err(AmpError::Api {
                message: message.clone(),
            });
        }
        let (_, (status, body)) = self
            .responses
            .iter()
            .find(|(path, _)| url.ends_with(**path))
            .unwrap_or_else(|| panic!("unexpected request URL: {}", url));
        Ok(HttpGetResult {
            status: *status,
            bytes: body.clone().into_bytes(),
        })
    }
}

#[tokio::test]
async fn read_maps_metric_names_in_order() -> Result<()> {
    let mock = MockHttp::with_responses(vec![(
        METRIC_NAMES_PATH,
        200,
        json!({"status": "success", "data": ["up", "cpu_usage"]}),
    )]);
    let source = AmpSource::with_transport(mock.clone());

    let envelopes = source
        .read(&test_config(), &["MetricNames".to_string()], None)
        .await?;

    assert_eq!(envelopes.len(), 2);
    assert_eq!(envelopes[0].stream, "MetricNames");
    assert_eq!(envelopes[0].data, json!({"metric_name": "up"}));
    assert_eq!(envelopes[1].data, json!({"metric_name": "cpu_usage"}));
    assert!(envelopes.iter().all(|e| e.emitted_at > 0));
    Ok(())
}

#[tokio::test]
async fn read_flattens_rule_groups() -> Result<()> {
    let payload = json!({
        "status": "success",
        "data": {
            "groups": [{
                "name": "availability",
                "rules": [{
                    "name": "R1",
                    "labels": {"severity": "critical", "system": "x"},
                    "annotations": {"description": "d"},
                    "alerts": [{"a": 1}]
                }]
            }]
        }
    });
    let mock = MockHttp::with_responses(vec![(RULES_PATH, 200, payload)]);
    let source = AmpSource::with_transport(mock.clone());

    let envelopes = source
        .read(&test_config(), &["Rules".to_string()], None)
        .await?;

    assert_eq!(envelopes.len(), 1);
    let record = &envelopes[0].data;
    assert_eq!(record["name"], "R1");
    assert_eq!(record["severity"], "critical");
    assert_eq!(record["system"], "x");
    assert_eq!(record["description"], "d");
    assert_eq!(record["labels"], json!({"severity": "critical", "system": "x"}));
    assert_eq!(record["annotations"], json!({"description": "d"}));
    assert_eq!(record["alerts"], json!([{"a": 1}]));
    assert_eq!(record["state"], serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn read_defaults_to_all_streams_in_declaration_order() -> Result<()> {
    let mock = MockHttp::with_responses(vec![
        (
            METRIC_NAMES_PATH,
            200,
            json!({"status": "success", "data": ["up"]}),
        ),
        (
            RULES_PATH,
            200,
            json!({"status": "success", "data": {"groups": [{"rules": [{"name": "R1"}]}]}}),
        ),
    ]);
    let source = AmpSource::with_transport(mock.clone());

    let envelopes = source.read(&test_config(), &[], None).await?;

    let streams: Vec<&str> = envelopes.iter().map(|e| e.stream.as_str()).collect();
    assert_eq!(streams, vec!["MetricNames", "Rules"]);
    Ok(())
}

#[tokio::test]
async fn empty_responses_yield_no_records() -> Result<()> {
    let mock = MockHttp::with_responses(vec![
        (METRIC_NAMES_PATH, 200, json!({"status": "success"})),
        (RULES_PATH, 200, json!({"status": "success", "data": {"groups": []}})),
    ]);
    let source = AmpSource::with_transport(mock.clone());

    let envelopes = source.read(&test_config(), &[], None).await?;

    assert!(envelopes.is_empty());
    Ok(())
}

#[tokio::test]
async fn non_2xx_status_surfaces_as_api_error() {
    let mock = MockHttp::with_responses(vec![(METRIC_NAMES_PATH, 403, json!({}))]);
    let source = AmpSource::with_transport(mock.clone());

    let err = source
        .read(&test_config(), &["MetricNames".to_string()], None)
        .await
        .unwrap_err();

    assert!(matches!(err, AmpError::Api { .. }));
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn invalid_json_body_is_fatal() {
    let mock = MockHttp::with_raw_response(METRIC_NAMES_PATH, 200, "not json");
    let source = AmpSource::with_transport(mock.clone());

    let err = source
        .read(&test_config(), &["MetricNames".to_string()], None)
        .await
        .unwrap_err();

    assert!(matches!(err, AmpError::Json(_)));
}

#[tokio::test]
async fn unknown_stream_fails_before_any_request() {
    let mock = MockHttp::with_responses(vec![]);
    let source = AmpSource::with_transport(mock.clone());

    let err = source
        .read(&test_config(), &["Metrics".to_string()], None)
        .await
        .unwrap_err();

    assert!(matches!(err, AmpError::UnknownStream(_)));
    assert!(mock.requests.lock().await.is_empty());
}

#[tokio::test]
async fn requests_carry_signature_headers() -> Result<()> {
    let mock = MockHttp::with_responses(vec![(
        METRIC_NAMES_PATH,
        200,
        json!({"status": "success", "data": []}),
    )]);
    let source = AmpSource::with_transport(mock.clone());

    source
        .read(&test_config(), &["MetricNames".to_string()], None)
        .await?;

    let requests = mock.requests.lock().await;
    let (url, headers) = &requests[0];
    assert_eq!(
        url,
        "https://aps-workspaces.eu-central-1.amazonaws.com/workspaces/ws-12345678-abcd-efgh-ijkl-000000000000/api/v1/label/__name__/values"
    );
    assert!(headers.contains_key("x-amz-date"));
    assert!(headers.contains_key("host"));
    assert!(headers.contains_key("authorization"));
    Ok(())
}

#[tokio::test]
async fn check_succeeds_on_an_empty_workspace() {
    let mock = MockHttp::with_responses(vec![(
        METRIC_NAMES_PATH,
        200,
        json!({"status": "success", "data": []}),
    )]);
    let source = AmpSource::with_transport(mock.clone());

    assert_eq!(
        source.check(&test_config()).await,
        ConnectionStatus::Succeeded
    );
}

#[tokio::test]
async fn check_converts_transport_failure_into_status() {
    let mock = MockHttp::failing("connection reset by peer");
    let source = AmpSource::with_transport(mock.clone());

    match source.check(&test_config()).await {
        ConnectionStatus::Failed { message } => {
            assert!(message.contains("connection reset by peer"));
        }
        other => panic!("expected failure status, got {:?}", other),
    }
}

#[test]
fn streams_exposes_one_reader_per_supported_stream() {
    use amp_source::streams::MetadataStream;

    let readers = AmpSource::new().streams(&test_config());
    let names: Vec<&str> = readers.iter().map(|s| s.stream_name()).collect();
    assert_eq!(names, vec!["MetricNames", "Rules"]);
}

#[tokio::test]
async fn discover_lists_both_streams_without_network() {
    let catalog = AmpSource::new().discover();

    let names: Vec<&str> = catalog.streams.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["MetricNames", "Rules"]);
    for descriptor in &catalog.streams {
        assert!(descriptor.json_schema.is_object());
    }
}

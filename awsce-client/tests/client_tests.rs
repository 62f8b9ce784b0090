//! HTTP-level tests for the Cost Explorer client against a local mock server

use awsce_client::CostExplorerClient;
use awsce_core::{
    ApiError, CostExplorerApi, CostExplorerNode, ExecuteOptions, ExecutionItem,
    GetCostAndUsageRequest, GetCostForecastRequest, Granularity, NodeParameters, TimeWindow,
};
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn client_for(server: &MockServer) -> CostExplorerClient {
    CostExplorerClient::builder()
        .static_credentials("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", None)
        .endpoint_url(server.uri())
        .build()
        .await
        .unwrap()
}

fn usage_request() -> GetCostAndUsageRequest {
    GetCostAndUsageRequest {
        time_period: TimeWindow::new("2023-01-01", "2023-02-01"),
        granularity: Granularity::Monthly,
        metrics: vec!["BlendedCost".to_string()],
    }
}

#[tokio::test]
async fn test_get_cost_and_usage_wire_format() {
    let server = MockServer::start().await;
    let response = json!({
        "ResultsByTime": [{
            "TimePeriod": {"Start": "2023-01-01", "End": "2023-02-01"},
            "Total": {"BlendedCost": {"Amount": "123.45", "Unit": "USD"}}
        }]
    });

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", "AWSInsightsIndexService.GetCostAndUsage"))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(body_json(json!({
            "TimePeriod": {"Start": "2023-01-01", "End": "2023-02-01"},
            "Granularity": "MONTHLY",
            "Metrics": ["BlendedCost"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(response.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client.get_cost_and_usage(&usage_request()).await.unwrap();
    assert_eq!(result, response);
}

#[tokio::test]
async fn test_get_cost_forecast_wire_format() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSInsightsIndexService.GetCostForecast"))
        .and(body_json(json!({
            "TimePeriod": {"Start": "2024-01-01", "End": "2024-04-01"},
            "Granularity": "MONTHLY",
            "Metric": "UNBLENDED_COST"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"Total": {"Amount": "456.78", "Unit": "USD"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let request = GetCostForecastRequest {
        time_period: TimeWindow::new("2024-01-01", "2024-04-01"),
        granularity: Granularity::Monthly,
        metric: Some("UNBLENDED_COST".to_string()),
    };
    let result = client.get_cost_forecast(&request).await.unwrap();
    assert_eq!(result["Total"]["Amount"], "456.78");
}

#[tokio::test]
async fn test_session_token_header_sent_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-security-token", "SESSION"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = CostExplorerClient::builder()
        .static_credentials("AKID", "SECRET", Some("SESSION".to_string()))
        .endpoint_url(server.uri())
        .build()
        .await
        .unwrap();

    client.get_cost_and_usage(&usage_request()).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);

    let tokens: Vec<_> = received[0]
        .headers
        .get_all("x-amz-security-token")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(tokens, vec!["SESSION".to_string()]);

    let auth = received[0].headers.get_all("authorization").iter().count();
    assert_eq!(auth, 1);
    let target = received[0].headers.get_all("x-amz-target").iter().count();
    assert_eq!(target, 1);
}

#[tokio::test]
async fn test_validation_exception() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "ValidationException",
            "message": "Start date (and hour) should be before end date (and hour)"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get_cost_and_usage(&usage_request()).await.unwrap_err();

    assert!(err.is_validation());
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("Start date"));
}

#[tokio::test]
async fn test_limit_exceeded_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.awsinsightsindexservice#LimitExceededException",
            "Message": "Rate exceeded"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get_cost_and_usage(&usage_request()).await.unwrap_err();

    assert!(err.is_throttled());
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_forbidden_is_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get_cost_and_usage(&usage_request()).await.unwrap_err();

    assert!(err.is_authentication());
    assert!(err.to_string().contains("HTTP 403"));
}

#[tokio::test]
async fn test_non_json_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client.get_cost_and_usage(&usage_request()).await.unwrap();
    assert_eq!(result, json!({"raw_response": "OK"}));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;
    drop(server);

    let err = client.get_cost_and_usage(&usage_request()).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

#[tokio::test]
async fn test_node_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSInsightsIndexService.GetCostAndUsage"))
        .and(body_json(json!({
            "TimePeriod": {"Start": "2023-01-01", "End": "2023-02-01"},
            "Granularity": "DAILY",
            "Metrics": ["BlendedCost", "UsageQuantity"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ResultsByTime": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({
            "TimePeriod": {"Start": "2023-02-01", "End": "2023-01-01"},
            "Granularity": "DAILY",
            "Metrics": ["BlendedCost", "UsageQuantity"]
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "ValidationException",
            "message": "Start date should be before end date"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let node = CostExplorerNode::new(client_for(&server).await);
    let params = NodeParameters::new()
        .with("timeStart", "={{ $json.start }}")
        .with("timeEnd", "={{ $json.end }}")
        .with("granularity", "DAILY")
        .with("metrics", json!(["BlendedCost", "UsageQuantity"]));

    let items = ExecutionItem::from_payloads(vec![
        json!({"start": "2023-01-01", "end": "2023-02-01"}),
        json!({"start": "2023-02-01", "end": "2023-01-01"}),
    ]);

    let output = node
        .execute(items, &params, ExecuteOptions::continue_on_fail())
        .await
        .unwrap();

    assert_eq!(output.len(), 2);
    assert_eq!(output[0].json, json!({"ResultsByTime": []}));
    assert!(output[0].error.is_none());

    let error = output[1].error.as_ref().unwrap();
    assert_eq!(error.item_index, 1);
    assert!(error.message.contains("Start date should be before end date"));
}

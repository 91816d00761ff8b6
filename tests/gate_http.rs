//! End-to-end tests of the gated service over real sockets.

use std::sync::Arc;
use std::time::Duration;

use bearer_gate::ClaimSet;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, ORIGIN};
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{client, start_gate, test_config, RecordingVerifier};

fn user1() -> ClaimSet {
    ClaimSet::new().with("sub", "user1").with("aud", "api://default")
}

#[tokio::test]
async fn valid_token_returns_claims() {
    let verifier = Arc::new(RecordingVerifier::new().accept("abc123", user1()));
    let gate = start_gate(test_config(), verifier.clone()).await;

    let res = client()
        .get(gate.url("/secure"))
        .header(AUTHORIZATION, "Bearer abc123")
        .send()
        .await
        .expect("gate unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"sub":"user1","aud":"api://default"}"#);
    assert_eq!(verifier.calls(), 1);
}

#[tokio::test]
async fn wrong_scheme_never_reaches_authority() {
    let verifier = Arc::new(RecordingVerifier::new().accept("abc123", user1()));
    let gate = start_gate(test_config(), verifier.clone()).await;
    let client = client();

    for value in ["Token abc123", "abc123", "Bearer ", "bearer abc123", "Basic abc123"] {
        let res = client
            .get(gate.url("/secure"))
            .header(AUTHORIZATION, value)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {value:?}");
        assert!(res.text().await.unwrap().is_empty());
    }

    let res = client.get(gate.url("/secure")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.text().await.unwrap().is_empty());

    assert_eq!(verifier.calls(), 0);
}

#[tokio::test]
async fn rejected_token_returns_reason() {
    let verifier = Arc::new(RecordingVerifier::new());
    let gate = start_gate(test_config(), verifier.clone()).await;

    let res = client()
        .get(gate.url("/secure"))
        .header(AUTHORIZATION, "Bearer forged")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), "token 'forged' is not valid");
    assert_eq!(verifier.calls(), 1);
}

#[tokio::test]
async fn token_with_inner_space_is_judged_by_authority() {
    let verifier = Arc::new(RecordingVerifier::new());
    let gate = start_gate(test_config(), verifier.clone()).await;

    let res = client()
        .get(gate.url("/secure"))
        .header(AUTHORIZATION, "Bearer a b")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), "token 'a b' is not valid");
    assert_eq!(verifier.calls(), 1);
}

#[tokio::test]
async fn oversized_body_is_rendered_as_json() {
    let mut config = test_config();
    config.limits.max_body_size = 16;
    let gate = start_gate(config, Arc::new(RecordingVerifier::new())).await;

    let res = client()
        .get(gate.url("/ping"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"status": 413, "message": "Payload Too Large"})
    );
}

#[tokio::test]
async fn repeated_requests_get_the_same_answer() {
    let verifier = Arc::new(RecordingVerifier::new().accept("abc123", user1()));
    let gate = start_gate(test_config(), verifier.clone()).await;
    let client = client();

    for _ in 0..3 {
        let ok = client
            .get(gate.url("/secure"))
            .header(AUTHORIZATION, "Bearer abc123")
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.json::<Value>().await.unwrap(), json!({"sub": "user1", "aud": "api://default"}));

        let denied = client
            .get(gate.url("/secure"))
            .header(AUTHORIZATION, "Bearer expired")
            .send()
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(denied.text().await.unwrap(), "token 'expired' is not valid");
    }

    assert_eq!(verifier.calls(), 6);
}

#[tokio::test]
async fn slow_authority_yields_503() {
    let verifier = Arc::new(
        RecordingVerifier::new()
            .accept("abc123", user1())
            .with_delay(Duration::from_secs(2)),
    );
    let mut config = test_config();
    config.verifier.timeout_ms = 100;
    let gate = start_gate(config, verifier).await;

    let res = client()
        .get(gate.url("/secure"))
        .header(AUTHORIZATION, "Bearer abc123")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        res.text().await.unwrap(),
        "Token verification did not complete within 100 ms"
    );
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let verifier = Arc::new(
        RecordingVerifier::new()
            .accept("abc123", user1())
            .with_delay(Duration::from_millis(200)),
    );
    let gate = start_gate(test_config(), verifier.clone()).await;
    let client = client();

    let requests = (0..8).map(|i| {
        let token = if i % 2 == 0 { "abc123" } else { "other" };
        client
            .get(gate.url("/secure"))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
    });
    let started = std::time::Instant::now();
    let responses = futures_join_all(requests).await;

    for (i, res) in responses.into_iter().enumerate() {
        let expected = if i % 2 == 0 { StatusCode::OK } else { StatusCode::UNAUTHORIZED };
        assert_eq!(res.unwrap().status(), expected);
    }
    // Verifications overlap rather than queue behind each other.
    assert!(started.elapsed() < Duration::from_millis(1200));
    assert_eq!(verifier.calls(), 8);
}

async fn futures_join_all<F, T>(futures: impl IntoIterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test]
async fn unmatched_path_is_404_from_responder() {
    let gate = start_gate(test_config(), Arc::new(RecordingVerifier::new())).await;

    let res = client().get(gate.url("/does-not-exist")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"status": 404, "message": "Not Found"})
    );
}

#[tokio::test]
async fn ping_and_cors() {
    let gate = start_gate(test_config(), Arc::new(RecordingVerifier::new())).await;

    let res = client()
        .get(gate.url("/ping"))
        .header(ORIGIN, "https://somewhere.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).map(|v| v.to_str().unwrap()),
        Some("*")
    );
    assert_eq!(res.json::<Value>().await.unwrap()["success"], true);
}

#[tokio::test]
async fn rejected_requests_still_carry_cors_headers() {
    let gate = start_gate(test_config(), Arc::new(RecordingVerifier::new())).await;

    let res = client()
        .get(gate.url("/secure"))
        .header(ORIGIN, "https://somewhere.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
}

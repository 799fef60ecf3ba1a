//! Common test utilities for ipo-status integration tests

use std::time::Duration;

use ipo_status::Config;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Delay used instead of the 3s default so the suite stays fast
pub const TEST_DELAY: Duration = Duration::from_millis(50);

/// Config pointing at `server` with a short poll delay
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = Url::parse(&server.uri()).expect("mock server URI is a URL");
    config.poll.delay = TEST_DELAY;
    config
}

/// Accept any login and return a profile with `pans`
pub async fn mount_login(server: &MockServer, pans: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {
                "email": "user@example.com",
                "id": "u-1",
                "name": "Test User",
                "phone_number": "9000000000",
                "pan_numbers": pans,
            }
        })))
        .mount(server)
        .await;
}

/// Answer status requests for `pan` with the given flags
pub async fn mount_status(server: &MockServer, pan: &str, applied: bool, alloted: bool, qty: &str) {
    Mock::given(method("POST"))
        .and(path("/get-ipo-status"))
        .and(body_partial_json(json!({ "pan_number": pan })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {
                "ipo_name": "X Ltd",
                "is_alloted": alloted,
                "is_applied": applied,
                "pan_number": pan,
                "securities_alloted": qty,
            }
        })))
        .mount(server)
        .await;
}

/// Answer status requests for `pan` with a bare HTTP status
pub async fn mount_status_failure(server: &MockServer, pan: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path("/get-ipo-status"))
        .and(body_partial_json(json!({ "pan_number": pan })))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of status requests the server has seen
pub async fn status_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/get-ipo-status")
        .count()
}

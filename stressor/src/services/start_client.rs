//! Client side of `POST /start-test`, used by the `start` subcommand

use reqwest::StatusCode;
use shared::{process_info, ProcessRole, StressTestSpec};

use crate::error::{StressorError, StressorResult};

#[derive(Debug, Clone)]
pub struct StartClient {
    client: reqwest::Client,
    stressor: String,
}

impl StartClient {
    pub fn new(stressor_endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            stressor: stressor_endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Ask the stressor to run `spec`. Anything but 201 is an error.
    pub async fn start(&self, spec: &StressTestSpec) -> StressorResult<()> {
        let url = format!("{}/start-test", self.stressor);
        let response = self.client.post(&url).json(spec).send().await?;

        if response.status() != StatusCode::CREATED {
            return Err(StressorError::StartRejected {
                status: response.status().as_u16(),
            });
        }

        process_info!(ProcessRole::current(), stressor = %self.stressor, target = %spec.target, "🎯 Stress test accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_the_spec_with_nanosecond_durations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/start-test"))
            .and(body_json(json!({
                "name": "",
                "target": "http://a:1",
                "method": "GET",
                "requestsPerSecond": 100,
                "workers": 10,
                "timeout": 0,
                "sustain": 5_000_000_000u64
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut spec = StressTestSpec::new("http://a:1");
        spec.method = "GET".into();
        spec.requests_per_second = 100;
        spec.workers = 10;
        spec.sustain = Duration::from_secs(5);

        StartClient::new(&format!("{}/", server.uri())).start(&spec).await.unwrap();
    }

    #[tokio::test]
    async fn conflict_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let err = StartClient::new(&server.uri())
            .start(&StressTestSpec::new("http://a:1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StressorError::StartRejected { status: 409 }));
    }
}

//! HTTP/JSON implementation of [`PredictionService`].

use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ServiceConfig;
use crate::domain::{AdvisoryResult, ApplicationInput, FeatureAttribution, Pipeline};
use crate::error::AppError;
use crate::service::{AdviceRequest, PredictionService, ServiceError};

pub struct HttpService {
    client: Client,
    base_url: String,
}

impl HttpService {
    pub fn new(config: &ServiceConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::usage(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(&config.base_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T, ServiceError> {
        let resp = req.send().map_err(|e| {
            warn!("{what} request failed: {e}");
            ServiceError::Transport(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("{what} returned status {status}");
            return Err(ServiceError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        debug!("{what} response: {} bytes", body.len());
        decode(&body)
    }
}

/// Successful bodies either carry the payload or the service's own error report.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Reported { error: String },
    Payload(T),
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(Envelope::Payload(v)) => Ok(v),
        Ok(Envelope::Reported { error }) => {
            warn!("service reported: {error}");
            Err(ServiceError::Reported(error))
        }
        Err(_) => {
            // Re-decode without the envelope for a precise message.
            let err = serde_json::from_str::<T>(body)
                .err()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unexpected response body".to_string());
            Err(ServiceError::Malformed(format!("Invalid service response: {err}")))
        }
    }
}

#[derive(Deserialize)]
struct PredictResponse {
    probability_of_default: f64,
}

#[derive(Deserialize)]
struct ExplainResponse {
    lime_explanation: FeatureAttribution,
}

#[derive(Deserialize)]
struct AdviceResponse {
    agent_interpretation: String,
    financial_advice: String,
}

#[derive(Deserialize)]
struct RootResponse {
    message: String,
}

impl PredictionService for HttpService {
    fn predict(&self, pipeline: Pipeline, input: &ApplicationInput) -> Result<f64, ServiceError> {
        let url = self.url(&format!("/predict/{}", pipeline.token()));
        debug!("POST {url}");
        let body: PredictResponse = self.send(self.client.post(&url).json(input), "predict")?;

        let p = body.probability_of_default;
        if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
            return Err(ServiceError::Malformed(format!(
                "Invalid service response: probability_of_default {p} is outside [0, 1]"
            )));
        }
        Ok(p)
    }

    fn explain(
        &self,
        pipeline: Pipeline,
        input: &ApplicationInput,
    ) -> Result<FeatureAttribution, ServiceError> {
        let url = self.url(&format!("/explain_custom_instance/{}", pipeline.token()));
        debug!("POST {url}");
        let body: ExplainResponse = self.send(self.client.post(&url).json(input), "explain")?;
        Ok(body.lime_explanation)
    }

    fn advise(&self, request: &AdviceRequest) -> Result<AdvisoryResult, ServiceError> {
        let url = self.url("/agent/advice");
        debug!("POST {url}");
        let body: AdviceResponse = self.send(self.client.post(&url).json(request), "advice")?;
        Ok(AdvisoryResult {
            interpretation: body.agent_interpretation,
            recommendation: body.financial_advice,
        })
    }

    fn health(&self) -> Result<String, ServiceError> {
        let url = self.url("/");
        debug!("GET {url}");
        let body: RootResponse = self.send(self.client.get(&url), "health")?;
        Ok(body.message)
    }

    fn explain_sample(&self, pipeline: Pipeline, index: usize) -> Result<FeatureAttribution, ServiceError> {
        let url = self.url(&format!("/explain/{}/{index}", pipeline.token()));
        debug!("GET {url}");
        let body: ExplainResponse = self.send(self.client.get(&url), "explain sample")?;
        Ok(body.lime_explanation)
    }
}

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the series this crate emits.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        describe_counter!("evaluations_total", "Successful video evaluations.");
        describe_counter!(
            "evaluation_errors_total",
            "Failed evaluations, labelled by error kind."
        );
        describe_counter!(
            "comments_classified_total",
            "Comments passed through the classifier."
        );
        describe_counter!("classifier_errors_total", "Non-2xx classifier responses.");
        describe_counter!("youtube_errors_total", "YouTube API transport/status errors.");
        describe_histogram!("evaluation_ms", "End-to-end evaluation time in milliseconds.");
        describe_histogram!("youtube_request_ms", "YouTube API request time in milliseconds.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

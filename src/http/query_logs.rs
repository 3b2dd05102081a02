use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::Status;

/// Structured log entry for a served request.
pub struct QueryEvent {
    method: &'static str,
    url: &'static str,
    handler: &'static str,
    start: Instant,
}

impl QueryEvent {
    pub fn new(method: &'static str, url: &'static str, handler: &'static str) -> Self {
        Self {
            method,
            url,
            handler,
            start: Instant::now(),
        }
    }

    pub fn log(self) {
        info!(
            http_request.request_method = self.method,
            http_request.request_url = self.url,
            labels.log_type = QUERY_LOGS,
            labels.handler = self.handler,
            request.latency = self.latency().as_millis(),
            "{}",
            self.handler
        )
    }

    pub fn log_error(self, status: &Status) {
        error!(
            http_request.request_method = self.method,
            http_request.request_url = self.url,
            labels.log_type = QUERY_LOGS,
            labels.handler = self.handler,
            labels.status = status.to_string(),
            request.latency = self.latency().as_millis(),
            "{}",
            self.handler
        )
    }

    fn latency(&self) -> Duration {
        self.start.elapsed()
    }
}

const QUERY_LOGS: &str = "query_logs";

//! In-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Replays queued responses in order and records every request it sees.
/// Running out of responses is reported as a network error.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses.borrow_mut().push_back(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// JSON body of the `index`-th recorded request.
    pub fn body(&self, index: usize) -> serde_json::Value {
        let requests = self.requests.borrow();
        let body = requests[index].body.as_deref().expect("request had no body");
        serde_json::from_str(body).expect("request body is not JSON")
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Network("connection refused".into()))
    }
}

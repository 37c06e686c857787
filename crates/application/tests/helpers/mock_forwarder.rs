use async_trait::async_trait;
use sieve_dns_application::ports::QueryForwarder;
use sieve_dns_application::{DnsQuery, DnsReply};
use sieve_dns_domain::DomainError;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

/// Records every forwarded query ID and answers with a fixed address or error.
#[derive(Clone)]
pub struct MockForwarder {
    answer: Ipv4Addr,
    error: Arc<Mutex<Option<DomainError>>>,
    calls: Arc<Mutex<Vec<u16>>>,
}

impl MockForwarder {
    pub fn new(answer: Ipv4Addr) -> Self {
        Self {
            answer,
            error: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: DomainError) -> Self {
        let mock = Self::new(Ipv4Addr::UNSPECIFIED);
        *mock.error.lock().unwrap() = Some(error);
        mock
    }

    pub fn calls(&self) -> Vec<u16> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl QueryForwarder for MockForwarder {
    async fn forward(&self, query: &DnsQuery) -> Result<DnsReply, DomainError> {
        self.calls.lock().unwrap().push(query.id());

        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }

        Ok(super::upstream_reply(query, self.answer))
    }
}

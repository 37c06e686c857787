use crate::dns_message::{response_skeleton, DnsQuery, DnsReply};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use sieve_dns_domain::BlockResponse;

/// Builds the fixed answer handed out for blocked names.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSynthesizer {
    response: BlockResponse,
}

impl ResponseSynthesizer {
    pub fn new(response: BlockResponse) -> Self {
        Self { response }
    }

    /// Reply with the query's ID and question plus one A record whose owner
    /// is the question name itself, so resolvers take it as a direct answer.
    pub fn synthesize(&self, query: &DnsQuery) -> DnsReply {
        let mut message = response_skeleton(query.message());
        message.set_authoritative(true);
        message.set_response_code(ResponseCode::NoError);

        if let Some(question) = query.question() {
            let rdata = RData::A(A(self.response.address));
            message.add_answer(Record::from_rdata(
                question.name().clone(),
                self.response.ttl,
                rdata,
            ));
        }

        DnsReply::synthesized(message)
    }
}

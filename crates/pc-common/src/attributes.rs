//! Attribute names attached to observability records.
//!
//! Downstream consumers match on these exact strings, so they must never change.

use serde::Serialize;

/// A well-known attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeKey {
    HttpRequestBody,
    HttpResponseBody,
    MessagingPayload,
    MessagingHeaders,
    GrpcRequestPayload,
    GrpcResponsePayload,
    DbResponseBody,
    DbResults,
    ProcessEnvironment,
}

impl AttributeKey {
    /// The wire name of this attribute.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AttributeKey::HttpRequestBody => "http.request.body",
            AttributeKey::HttpResponseBody => "http.response.body",
            AttributeKey::MessagingPayload => "messaging.message.payload",
            AttributeKey::MessagingHeaders => "messaging.message.headers",
            AttributeKey::GrpcRequestPayload => "rpc.grpc.request.payload",
            AttributeKey::GrpcResponsePayload => "rpc.grpc.response.payload",
            AttributeKey::DbResponseBody => "db.response.body",
            AttributeKey::DbResults => "db.results",
            AttributeKey::ProcessEnvironment => "process.environ",
        }
    }

    /// All known attribute keys.
    pub const ALL: [AttributeKey; 9] = [
        AttributeKey::HttpRequestBody,
        AttributeKey::HttpResponseBody,
        AttributeKey::MessagingPayload,
        AttributeKey::MessagingHeaders,
        AttributeKey::GrpcRequestPayload,
        AttributeKey::GrpcResponsePayload,
        AttributeKey::DbResponseBody,
        AttributeKey::DbResults,
        AttributeKey::ProcessEnvironment,
    ];
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Payload capture core.
//!
//! Transport adapters push observed bytes into a capture buffer or a streaming
//! bridge as they arrive; when the exchange completes the buffer is decoded
//! exactly once and attached to the observability record through an
//! [`AttributeSink`](pc_common::AttributeSink).
//!
//! Modules:
//! - [`charset`]: content-type → decoder resolution
//! - [`capture`]: capture-once byte and character buffers
//! - [`bridge`]: context-keyed accumulators for streamed bodies
//! - [`rows`]: length-bounded result-set row serialization
//! - [`messaging`]: message header and payload helpers
//! - [`environment`]: the scrubbed process environment resource
//! - [`runtime`]: the configuration-derived object threaded to call sites
//!
//! None of the capture entry points panic or return errors to the caller.

pub mod bridge;
pub mod capture;
pub mod charset;
pub mod environment;
pub mod error;
pub mod framing;
pub mod logging;
pub mod messaging;
pub mod rows;
pub mod runtime;

pub use bridge::{payload_or_no_body, BodyFraming, BridgeRegistry, StreamingBridge, NO_BODY_MARKER};
pub use capture::{ByteCaptureBuffer, CaptureBuffer, CaptureStorage, CharCaptureBuffer};
pub use charset::{resolve, resolve_name, Charset};
pub use environment::EnvironmentResource;
pub use error::{CoreError, Result};
pub use rows::{
    serialize_row_array, CellValue, ResultCapture, RowField, RowSerializer, FIELD_OVERHEAD,
    JSON_TRUNCATION_MARKER,
};
pub use runtime::CaptureRuntime;

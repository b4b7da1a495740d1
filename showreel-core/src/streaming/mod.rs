//! Range-request media streaming.
//!
//! Parses HTTP `Range` headers, resolves them against stored resources and
//! produces chunked 200/206 responses.

pub mod body;
pub mod error;
pub mod range;
pub mod responder;

pub use body::media_body_stream;
pub use error::MediaError;
pub use range::{ByteRange, RangeParseError, RangeSpec};
pub use responder::MediaResponder;

//! Raw event line protocol: byte framing and line classification.

pub mod framing;
pub mod line;

pub use framing::LineFramer;
pub use line::{classify, classify_line, Axis, LineDialect, LineEvent, RawSample};

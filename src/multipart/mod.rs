//! Multipart
//!
//! multipart/form-data body construction: parts, boundary, byte sinks and
//! sources, and the encoder that ties them together.

pub mod boundary;
pub mod encoder;
pub mod part;
pub mod sink;
pub mod source;

pub use boundary::Boundary;
pub use encoder::{EncoderConfig, MultipartEncoder, DEFAULT_CHUNK_SIZE};
pub use part::{FileSource, FormPart};
pub use sink::{ByteSink, FileSink, MemorySink};
pub use source::{ChainedSource, PartSource};

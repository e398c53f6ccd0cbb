//! ledgerscan-ingest: reading staged statement images into inline payloads.

pub mod encode;
pub mod media;

pub use encode::{EncodeError, EncodedImage, encode_all, encode_bytes, encode_file};
pub use media::media_type_for;

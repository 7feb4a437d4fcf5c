pub mod codec;
pub mod error;

pub use codec::JpegCodec;

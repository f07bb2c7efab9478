pub(crate) mod core;
pub(crate) mod snappy;

pub use core::BlockCodec;
pub use snappy::SnappyCodec;

//! Template image and font assets: decoding, path registry and the bounded in-memory cache.

pub mod cache;
pub mod decode;
pub mod font;
pub mod registry;

//! Pixel-level building blocks: premultiplied canvas compositing, text shaping and
//! rasterization, and artifact encoding.

pub mod canvas;
pub mod encode;
pub mod text;

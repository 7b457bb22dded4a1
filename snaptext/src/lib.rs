//! Snaptext: an HTTP relay that turns uploaded images into text by way of an
//! external vision-language model (hosted API or local daemon). There is no
//! OCR engine here; the crate's job is upload validation, image
//! normalization, provider selection, and a uniform response envelope.

pub mod api;
pub mod config;
pub mod error;
pub mod ocr;

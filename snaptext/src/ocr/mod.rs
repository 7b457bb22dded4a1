//! Image-to-text extraction via external vision-language models.
//!
//! There is no OCR model in this crate: all text extraction is delegated to
//! a provider selected per request. The module carries the two pieces of
//! reusable design:
//!
//! - `normalizer` — validate, color-convert, downscale, and re-encode an
//!   uploaded image before transmission.
//! - `provider` / `hosted` / `local` — a closed two-variant capability
//!   ([`Extractor`]) behind an explicit factory ([`ExtractorFactory`]):
//!   a hosted chat-completions API keyed by a caller credential, and a
//!   local model daemon that takes image file paths.
//!
//! Provider failures are terminal for a request; nothing here retries.

mod hosted;
mod local;
mod normalizer;
mod provider;

pub use hosted::HostedClient;
pub use local::LocalClient;
pub use normalizer::{normalize_image, NormalizedImage, NORMALIZED_MIME_TYPE};
pub use provider::{Extractor, ExtractorFactory, Provider};

//! Champion splash artwork.
//!
//! Downloads splash art from the static asset CDN, decodes it, and
//! re-encodes images as PNG for transfer to the watch.

pub mod codec;
pub mod fetcher;

pub use codec::{DecodeError, decode, decode_png, encode_png};
pub use fetcher::{FetchError, SplashFetcher};

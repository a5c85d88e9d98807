//! Cross-crate scenarios: a handheld and a wearable paired in-process,
//! talking to mock stats API and CDN servers.

mod end_to_end;
mod properties;
mod support;

// Text-level extraction helpers
//
// - manifest: finds an HLS manifest URL in fetched page text, plain or
//   hidden in a base64 string literal
// - diagnostics: classifies fetch failures for retry decisions and logs
//
// Nothing in here performs I/O.

mod diagnostics;
mod manifest;

pub use diagnostics::{diagnose_failure, diagnose_status, FailureReason};
pub use manifest::{extract_manifest_url, extract_with_source, MatchSource};

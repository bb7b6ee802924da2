//! Activity domain - requests to open external activities and the results
//! they report.

mod request;
mod result;

pub use request::{ActivityKind, ActivityMode, ActivityRequest};
pub use result::{ActivityResult, ActivityResultCode, VerifiedOutcome};

//! Public types for the Huginn API.

mod entry;
mod outcome;
mod request;

pub use entry::{CacheEntry, SaveRequest};
pub use outcome::{FetchOutcome, Response, Source, UNAVAILABLE_STATUS};
pub use request::Request;

//! Result normalization
//!
//! Backends answer in their own shape. Everything above the router sees
//! only [`QueryResult`].

mod native;
mod normalizer;
mod query_result;

pub use native::NativeResult;
pub use normalizer::{output_name, NormalizedRows, ResultNormalizer};
pub use query_result::QueryResult;

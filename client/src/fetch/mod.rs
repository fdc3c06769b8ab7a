//! Retrieval of test records from the results service

mod http;
mod record;

pub use http::HttpFetcher;
pub use record::{cell_text, columns, ResultSet, TestRecord};

use crate::session::FetchRequest;
use thiserror::Error;

/// Every way a fetch can fail, delivered as a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No usable response: transport failure or a non-auth error status
    #[error("Network error: {0}")]
    Network(String),

    /// The service rejected the credentials (401/403)
    #[error("Unauthorized: the service rejected the credentials")]
    Unauthorized,

    /// A success response whose body is not a sequence of records
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Stable name for structured diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Unauthorized => "unauthorized",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// Where a session's records come from
///
/// Fetches run on their own tasks, so sources and their futures must be `Send`.
pub trait RecordSource: Send + Sync + 'static {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<ResultSet, FetchError>> + Send;
}

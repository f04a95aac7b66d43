//! QueryBackend trait definition.
//!
//! The remote analytics service that answers natural-language queries about
//! a user's connected data sources.

use lakechat_types::error::BackendError;
use lakechat_types::query::QueryResult;

/// Client for the remote query backend.
///
/// Implementations live in lakechat-infra (e.g., `HttpQueryBackend`).
/// No retries and no in-flight limits here: the session enforces at most
/// one outstanding query.
pub trait QueryBackend: Send + Sync {
    /// One-shot data source setup, issued when a new room is created.
    fn initialize_data_source(
        &self,
        company_id: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;

    /// Submit a query and parse the typed reply.
    fn submit_query(
        &self,
        company_id: &str,
        query: &str,
    ) -> impl std::future::Future<Output = Result<QueryResult, BackendError>> + Send;
}

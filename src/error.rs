use thiserror::Error;

/// Errors surfaced by the trend cache.
///
/// Reads (`get`, `get_score`, `top_k`) never error — absence and expiry are
/// routine states reported as `None`/empty. The only failure path is an
/// increment that has no value to install: nothing was supplied, no prior
/// entry exists, and either there is no loader or the loader itself failed.
#[derive(Error, Debug)]
pub enum TrendCacheError {
    #[error("no value supplied for new key and no loader configured")]
    NoValue,
    #[error("loader failed: {0}")]
    Loader(#[source] Box<dyn std::error::Error + Send + Sync>),
}

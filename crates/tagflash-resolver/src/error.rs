use tagflash_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the resolver.
///
/// A failing store is always reported; the resolver never falls back to a
/// default value when it could not read the override.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

pub type ResolveResult<T> = Result<T, ResolveError>;

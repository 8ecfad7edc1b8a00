//! Unified error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DbError;

/// The error type returned by quay's fallible startup operations.
///
/// Request-level failures (404, 400, …) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// the failures that stop the process from starting: a bad configuration,
/// an unreachable database, or a port that cannot be bound.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] DbError),
}

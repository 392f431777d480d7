use tagflash_resolver::ResolveError;
use tagflash_types::BuildingType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no building type selected")]
    NoSelection,

    #[error("session already armed with {building}; disarm first")]
    AlreadyArmed { building: BuildingType },

    #[error("resolver error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("write controller has stopped")]
    ControllerClosed,
}

pub type SessionResult<T> = Result<T, SessionError>;

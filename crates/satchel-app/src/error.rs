use satchel_core::error::DomainError;
use satchel_ports::error::{GeocodeError, PortError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("port error: {0}")]
    Port(#[from] PortError),
    #[error("geocode error: {0}")]
    Geocode(#[from] GeocodeError),
}

impl AppError {
    /// True when the caller should show the reason and let the guardian
    /// fix their selection, rather than treat it as an outage.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AppError::Domain(_))
    }
}

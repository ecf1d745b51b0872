use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("not found")]
    NotFound,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder unavailable: {0}")]
    Unavailable(String),
    #[error("geocoder rejected the query: {0}")]
    BadQuery(String),
}

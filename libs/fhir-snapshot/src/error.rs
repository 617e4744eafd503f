//! Error types for snapshot completion

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Differential error in {url}: {message}")]
    Differential { url: String, message: String },
}

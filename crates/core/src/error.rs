use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("transport error: {0}")]
	Transport(#[from] aw_runtime::TransportError),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

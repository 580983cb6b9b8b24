pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Dispatch error: {message}")]
	Dispatch { message: String },
}
impl From<scout_storage::Error> for Error {
	fn from(err: scout_storage::Error) -> Self {
		match err {
			scout_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			scout_storage::Error::NotFound(message) => Self::NotFound { message },
			scout_storage::Error::Conflict(message) => Self::Conflict { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

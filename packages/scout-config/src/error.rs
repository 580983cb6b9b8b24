use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read scout config {}: {source}", path.display())]
	ReadConfig {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("Cannot parse scout config {}: {source}", path.display())]
	ParseConfig {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("Invalid scout config: {message}")]
	Validation { message: String },
}

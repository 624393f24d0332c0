pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to parse environment variable {key}: {message}")]
	ParseEnv { key: String, message: String },
	#[error("{message}")]
	Validation { message: String },
}

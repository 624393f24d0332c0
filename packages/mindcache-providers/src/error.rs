pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error("Unrecognized {kind} URL: {url}")]
	InvalidSource { kind: &'static str, url: String },
	#[error("The source reports no data for {id}.")]
	SourceNotFound { id: String },
	#[error("{message}")]
	Extraction { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}

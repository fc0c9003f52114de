use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
	#[error("Malformed frame: {0}")]
	Malformed(#[source] serde_json::Error),

	#[error("Failed to encode {kind}: {source}")]
	Encode {
		kind: &'static str,
		#[source]
		source: serde_json::Error,
	},

	#[error("Unsupported frame: {0}")]
	Unsupported(&'static str),
}

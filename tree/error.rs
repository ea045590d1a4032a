use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	/// The training data was rejected before any state was changed.
	#[error("invalid input: {0}")]
	InvalidInput(String),
	/// A round of training failed. Trees from the rounds before it remain in the model.
	#[error("training failed in round {round}")]
	Round {
		round: usize,
		#[source]
		source: RoundError,
	},
	#[error("invalid model: {0}")]
	InvalidModel(String),
	#[error("unknown major version {0}")]
	UnknownVersion(u8),
	#[error(transparent)]
	Json(#[from] serde_json::Error),
	#[error(transparent)]
	Encode(#[from] rmp_serde::encode::Error),
	#[error(transparent)]
	Decode(#[from] rmp_serde::decode::Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RoundError {
	#[error("the gradient for example {example} is not finite")]
	NonFiniteGradient { example: usize },
}

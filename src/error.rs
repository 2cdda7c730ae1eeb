use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LdaError {
    #[error("Invalid hyperparameter {name}: {value}")]
    InvalidHyperparameter { name: &'static str, value: f64 },
    #[error("Corpus does not match the model definition: {0}")]
    DimensionMismatch(String),
    #[error("Latent state counts are inconsistent: {0}")]
    InconsistentCounts(String),
    #[error("Malformed LDA-C input on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Could not read or write corpus")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LdaError>;

use nd::ShapeError;
use nla_factorize::CholeskyError;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  /// Invalid schedule parameters, mismatched step size or a dimensional
  /// mismatch between collaborating pieces.
  #[error("configuration error: {0}")]
  Configuration(String),
  /// A bad argument at call time: sample counts, indices, wavenumbers.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
  #[error("factorization failed: {0}")]
  Factorization(#[from] CholeskyError),
}

impl Error {
  pub fn config<T: Into<String>>(msg: T) -> Error {
    Error::Configuration(msg.into())
  }
  pub fn invalid<T: Into<String>>(msg: T) -> Error {
    Error::InvalidArgument(msg.into())
  }

  pub fn is_configuration(&self) -> bool {
    match self {
      &Error::Configuration(_) => true,
      _ => false,
    }
  }
  /// Factorization failures come from a bad input matrix, so they count
  /// as invalid arguments too.
  pub fn is_invalid_argument(&self) -> bool {
    match self {
      &Error::InvalidArgument(_) | &Error::Factorization(_) => true,
      _ => false,
    }
  }
}

impl From<ShapeError> for Error {
  fn from(v: ShapeError) -> Error {
    Error::Configuration(v.to_string())
  }
}

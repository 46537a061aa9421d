pub mod error;

pub use error::{DecodeError, InitError, SignError};

#![forbid(unsafe_code)]

pub mod assessment;
pub mod error;
pub mod model;
pub mod time;

pub use error::{Error, InvalidStateError};
pub use time::{Clock, Countdown};

#![forbid(unsafe_code)]

pub mod countdown;
pub mod error;
pub mod model;
pub mod scoring;
pub mod shuffle;
pub mod time;

pub use error::Error;
pub use time::Clock;

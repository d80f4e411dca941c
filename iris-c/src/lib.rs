pub mod batch;
pub mod client;
pub mod util;

pub use client::{ClientError, IrisClient};

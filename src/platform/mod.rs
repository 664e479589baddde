pub mod client;

pub use client::{ChallengeApi, PlatformClient, PlatformError};

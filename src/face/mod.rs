//! Client for the external face recognition service.

pub mod client;
pub mod error;
pub mod response;

pub use client::{FaceClient, FaceRecognizer};
pub use error::FaceApiError;
pub use response::IdentifyResult;

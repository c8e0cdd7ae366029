//! HTTP action API for the Patricians backend.

mod api;
mod error;
mod http;

pub use api::{GameApi, InitialInfluenceResponse, VoteResponse};
pub use error::{ClientError, ClientErrorKind, ErrorBody, rejection_reason};
pub use http::HttpGameClient;

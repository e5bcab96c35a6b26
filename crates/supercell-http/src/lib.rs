//! # Supercell HTTP
//!
//! The request and response types the dispatcher works on. The transport
//! collaborator turns wire requests into [`Request`] (see
//! [`Request::from_hyper`]) and sends [`Response`] back once it is finished
//! (see [`Response::into_hyper`]). No socket handling lives here.

pub mod request;
pub mod response;

pub use request::{Request, RequestBuilder, decode_argument};
pub use response::Response;

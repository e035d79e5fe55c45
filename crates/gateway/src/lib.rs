#![forbid(unsafe_code)]

pub mod http;
pub mod remote;

pub use http::{HttpGateway, HttpGatewayConfig};
pub use remote::{
    AuthGateway, AvatarStore, Gateway, GatewayError, InMemoryGateway, ProfileGateway,
    ProgressGateway, ProjectGateway, SignUpRequest,
};

pub mod client;
pub mod types;

pub use client::{
    ArchiveWindow, ClientOptions, EnabledEndpoints, Payload, SubEndpointKind, SymoClient,
};

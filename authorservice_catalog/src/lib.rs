pub mod api;
pub mod etag;
pub mod resource;

#[cfg(any(feature = "client", test))]
pub mod client;

#[cfg(any(feature = "server", test))]
pub mod app_config;
#[cfg(any(feature = "server", test))]
pub mod documents_repository;
#[cfg(any(feature = "server", test))]
mod handlers;

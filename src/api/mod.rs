pub mod auth;
pub(crate) mod client;
pub mod storage;

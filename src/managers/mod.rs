pub mod collections;
pub mod http_client;

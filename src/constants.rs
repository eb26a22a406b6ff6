pub mod network {
    pub const ENV_HTTP_TIMEOUT_MS: &str = "COURIER_HTTP_TIMEOUT_MS";
    pub const ENV_MAX_REDIRECTS: &str = "COURIER_MAX_REDIRECTS";
    pub const DEFAULT_MAX_REDIRECTS: usize = 10;
    pub const RAW_BODY_CONTENT_TYPE: &str = "application/json";
    pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
}

pub mod storage {
    pub const ENV_STORAGE_DIR: &str = "COURIER_STORAGE_DIR";
    pub const DEFAULT_DIR: &str = "localstorage";
    pub const DOCUMENT_EXTENSION: &str = ".json";
}

pub mod logging {
    pub const MAX_LOGGED_BODY_BYTES: usize = 2 * 1024;
}

pub mod server {
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    pub const SERVER_NAME: &str = "courier";
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

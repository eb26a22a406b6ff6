pub mod fs_atomic;
pub mod query;
pub mod redact;
pub mod suggest;
pub mod tool_errors;

mod init;
mod trace_id;

pub use init::{init_logger, warn_if_slow};
pub use trace_id::TraceId;

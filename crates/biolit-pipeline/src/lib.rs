//! Per-article orchestration: tag, normalize, resolve, register, link.

mod pipeline;

pub use pipeline::Pipeline;

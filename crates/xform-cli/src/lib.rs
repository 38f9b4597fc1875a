//! Library side of the `xform` command: logging setup and the file pipeline.

pub mod logging;
pub mod pipeline;

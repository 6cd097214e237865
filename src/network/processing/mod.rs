pub mod pipeline;
pub mod processor;

pub use pipeline::Pipeline;
pub use processor::{run_processing_loop, PacketSink};

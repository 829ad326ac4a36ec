pub mod command_cache;
pub mod message_pipeline;

pub use message_pipeline::{InboundMessage, MessageOutcome, MessagePipeline, PipelineSettings};

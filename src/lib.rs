pub mod audio;
pub mod chunk;
pub mod config;
pub mod detect;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod trim;

pub use config::Params;
pub use error::{DesilenceError, Result};
pub use pipeline::{
    print_summary, remove_silence, PipelineOptions, PipelineResult, PipelineStats,
};

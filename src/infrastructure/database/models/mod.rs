pub mod chunk_model;
pub mod job_model;

pub use chunk_model::*;
pub use job_model::*;

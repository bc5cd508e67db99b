pub mod job_repository;
pub mod vector_repository;

pub use job_repository::JobRepository;
pub use vector_repository::VectorRepository;

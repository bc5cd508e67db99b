pub mod in_memory_job_repository;
pub mod in_memory_vector_repository;

pub use in_memory_job_repository::InMemoryJobRepository;
pub use in_memory_vector_repository::InMemoryVectorRepository;

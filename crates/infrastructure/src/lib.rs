//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_parameter_repository;

pub use in_memory_parameter_repository::InMemoryParameterRepository;

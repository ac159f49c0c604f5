/// Application layer - Use cases and DTOs
///
/// This layer contains the application logic that orchestrates
/// domain services and coordinates with infrastructure through ports.
pub mod catalog_service;
pub mod dto;
pub mod factories;
pub mod scheduler;
pub mod use_cases;

pub use catalog_service::CatalogService;

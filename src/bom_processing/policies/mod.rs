pub mod dev_dependency_policy;

pub use dev_dependency_policy::DevDependencyPolicy;

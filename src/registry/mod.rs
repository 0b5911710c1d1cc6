//! # Component Registry
//!
//! Registration and discovery of managed components. The registry is an
//! explicit object handed to the orchestrator at construction; there is no
//! ambient global state.

pub mod component_registry;

pub use component_registry::{
    ComponentEndpoint, ComponentRegistry, RegisteredComponent, RegistryError, RegistryStats,
};

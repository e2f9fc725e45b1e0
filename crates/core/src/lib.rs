//! Core library for the runner autoscaler
//!
//! This crate contains the domain logic shared by the webhook dispatcher and
//! the Platform API client:
//! - Scale-target resolution (`resolver`)
//! - Capacity-reservation bookkeeping (`engine`)
//! - The declarative HRA/workload data model and its secondary index

pub mod engine;
pub mod index;
pub mod model;
pub mod platform;
pub mod resolver;
pub mod store;

pub use engine::{EngineError, apply_reservation_delta};
pub use model::{EventContext, Hra, OwnerType, RunnerWorkload, ScaleTarget};
pub use platform::{PlatformClientError, PlatformGroupClient};
pub use resolver::{ResolverError, resolve};
pub use store::{HraRepository, StoreError, WorkloadRepository};

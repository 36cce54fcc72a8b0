//! Resource-graph compiler for SoftFactory.
//!
//! Turns a validated [`FactoryConfig`] into a [`ResourceGraph`]. Compilation
//! does no I/O and the same input always produces the same graph. Each
//! builder stage consumes the graph produced by the previous one and returns
//! it extended:
//!
//! 1. [`foundation`]: object stores, audit trail, private network
//! 2. [`subsystems`]: optional worker fleet and workbench
//! 3. [`pipeline`]: source stage and configured build stages
//! 4. [`grants`]: permission grants for every principal present
//!
//! [`fanout`] repeats this per environment of a deployment document.
//!
//! [`FactoryConfig`]: softfactory_config::FactoryConfig
//! [`ResourceGraph`]: softfactory_core::ResourceGraph

pub mod compiler;
pub mod context;
pub mod error;
pub mod fanout;
pub mod foundation;
pub mod grants;
pub mod ids;
pub mod pipeline;
pub mod subsystems;

pub use compiler::compile;
pub use error::{SynthError, SynthResult};
pub use fanout::{Deployment, EnvironmentGraph, compile_document};

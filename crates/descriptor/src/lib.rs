//! Import resolution and descriptor set assembly
//!
//! This crate turns a list of root `.proto` files into a flat
//! `FileDescriptorSet` covering the roots and everything they import.
//!
//! ## Pieces
//! - [`Resolver`]: the import-resolution capability. [`ProtoxResolver`]
//!   backs it with the `protox` compiler; [`MemoryResolver`] is an
//!   in-memory graph for tests.
//! - [`DescriptorSetBuilder`]: breadth-first closure over the resolver's
//!   dependency graph, deduplicated by file name.
//! - [`DescriptorCollection`]: the ordered result, serializable as a
//!   `FileDescriptorSet`.
//!
//! ## Example
//! ```rust,ignore
//! use protoc_wrapper_descriptor::{DescriptorSetBuilder, ProtoxResolver};
//!
//! let mut resolver = ProtoxResolver::new(["proto"])?;
//! let roots = ["service.proto".into()];
//! let collection = DescriptorSetBuilder::new().build(&roots, &mut resolver)?;
//! collection.write_to(&mut std::io::stdout().lock())?;
//! ```

mod builder;
mod memory;
mod record;
mod resolver;
mod roots;

pub use builder::{ensure_roots, DescriptorSetBuilder};
pub use memory::MemoryResolver;
pub use record::{DescriptorCollection, DescriptorRecord};
pub use resolver::{ProtoxResolver, Resolver};
pub use roots::normalize_root;

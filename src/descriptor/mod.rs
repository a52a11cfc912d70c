// src/descriptor/mod.rs
//! Type descriptors, instances and operation values
//!
//! - **TypeDescriptor**: mutable `name -> Operation` table, one per type
//! - **Instance**: state plus a handle to its descriptor; dispatches by name
//! - **Operation**: shared async callable taking an [`Invocation`]
//!
//! ```text
//! instance.call("fetch", args)
//!     │
//!     └─ descriptor.resolve("fetch") ──► outermost wrapper
//!                                            └─ ... ──► original operation
//! ```

pub mod instance;
pub mod operation;
pub mod type_descriptor;

// Re-export commonly used types
pub use instance::Instance;
pub use operation::{callback, operation, Callback, Invocation, OpFuture, Operation, Value};
pub use type_descriptor::TypeDescriptor;

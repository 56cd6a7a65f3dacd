//! # Core Module
//!
//! Shared-ownership primitives used throughout the crate.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//!
//! ## Usage
//! ```rust
//! use rail_world::core::MtResource;
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

pub mod mt_resource;

pub use mt_resource::MtResource;

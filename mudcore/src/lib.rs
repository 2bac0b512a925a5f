#![deny(warnings)]
#![cfg_attr(test, allow(warnings))]

//! Persistence and resource-allocation core for a line-oriented multi-user
//! text server: an attribute list, a freelist allocator, a fixed-capacity
//! priority queue, a flat-file record store (FDB), and the entity registry
//! that ties the three together for rooms, characters, and user accounts.
//!
//! The server's protocol handling, command table, and VM are out of scope;
//! this crate only exposes the narrow surface they consume (see
//! [`registry::EntityRegistry`] and [`fdb`]).

// Lets `#[derive(Entity)]`-generated code refer to `mudcore::...` paths
// uniformly whether the derive is used inside this crate (see `entities`)
// or by a downstream crate.
extern crate self as mudcore;

pub mod attrlist;
pub mod common;
pub mod entities;
pub mod error;
pub mod fdb;
pub mod freelist;
pub mod pqueue;
pub mod registry;
pub mod schema;

#[cfg(test)]
mod test_support;

pub use attrlist::{AttributeEntry, AttributeList};
pub use common::{mudcore_get_data_dir, mudcore_set_data_dir, ID_MAX};
pub use error::{Error, Result};
pub use freelist::{Extent, Freelist};
pub use pqueue::{PrioElement, PriorityQueue};
pub use registry::EntityRegistry;
pub use schema::{FieldDescriptor, FieldType, Schema};

pub use mudcore_derive::Entity;

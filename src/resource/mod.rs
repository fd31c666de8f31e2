//! Resource abstraction layer
//!
//! Resource kinds are declared in `src/resources/scrumy.json` and turned into
//! a [`Registry`] of [`ResourceDefinition`]s. A request for a resource name is
//! resolved against its URL templates, fetched, and materialized into
//! [`Entity`] values whose lazy fields pull child resources on first access.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and validates resource definitions
//! - [`template`] - URL template expansion and name singularization
//! - [`dispatch`] - Maps a resource name + selector to a fetch
//! - [`entity`] - Materialized entities and lazy-field resolution
//! - [`helpers`] - Computed fields declared per resource

pub mod dispatch;
pub mod entity;
pub mod helpers;
pub mod registry;
pub mod template;

pub use dispatch::Selector;
pub use entity::{materialize, Entity, Fetched};
pub use registry::{Registry, ResourceDefinition, ResourceDefinitionBuilder};
pub use template::{resolve, singularize};

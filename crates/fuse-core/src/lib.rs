//! Core library for fuse: zone/layout composition on top of Handlebars.
//!
//! A layout declares named zones; an external composition step decides which
//! units fill each zone ([`registry::ZoneRegistry`]); the
//! [`compositor::ZoneCompositor`] expands every zone into the rendered
//! templates of its units, in order. Unit templates are compiled once per
//! canonical path and kept in a [`cache::TemplateCache`].
//!
//! Per-render state (request id, the zone currently resolving) lives in a
//! [`context::RequestContext`], so one compositor can serve concurrent renders.

pub mod cache;
pub mod compositor;
pub mod config;
pub mod context;
pub mod error;
mod helpers;
pub mod registry;
pub mod resource;

pub use cache::TemplateCache;
pub use compositor::{SafeString, ZoneCompositor};
pub use config::FuseConfig;
pub use context::RequestContext;
pub use error::{FuseError, Result};
pub use helpers::{DEFINE_ZONE, LAYOUT, ZONE};
pub use registry::ZoneRegistry;
pub use resource::{FileSystemLoader, ResourceLoader, TemplateResource};

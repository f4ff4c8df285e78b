//! # OxNB Content
//!
//! XNB container and content readers for the OxNB toolkit.
//!
//! This crate provides the container layer of the stack:
//!
//! - [`header`]: XNB header fields and the flag-byte layout
//! - [`registry`]: the reader table and payload dispatch
//! - [`readers`]: wire codecs for `Texture2D`, `SoundEffect` and the SFD
//!   item/animation formats
//! - [`container`]: top-level pack and unpack, including LZX and LZ4
//!   payload handling
//! - [`document`]: sidecar-aware JSON serialization of decoded assets
//!
//! ## Example
//!
//! ```no_run
//! use oxnb_content::Container;
//!
//! let bytes = std::fs::read("OfficerHat.xnb").unwrap();
//! let document = Container::unpack(&bytes).unwrap();
//! println!("{} readers", document.readers.len());
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod container;
pub mod content;
pub mod document;
pub mod dxt;
pub mod header;
pub mod media;
pub mod readers;
pub mod registry;

pub use container::Container;
pub use content::{
    Animation, AnimationFrame, Content, FrameCollision, FramePart, ItemPart, SfdItem, SoundEffect,
    SurfaceFormat, Texture2D,
};
pub use document::{Document, SidecarEmit, SidecarLoad};
pub use header::{Compression, TargetPlatform, XnbHeader};
pub use registry::{ReaderEntry, ReaderKind, ReaderRegistry};

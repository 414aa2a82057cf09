//! Mirage — a dynamically growable CPU/GPU mirrored element buffer.
//!
//! [`MirroredVec`] owns a densely packed CPU-side store of fixed-stride
//! elements together with a GPU buffer object that mirrors it, and keeps the
//! two synchronized under mutation: single-slot uploads for single-element
//! operations, one batched transfer for bulk appends, and a full live-region
//! re-upload only when growth reallocates the device storage.
//!
//! The device side sits behind the [`GpuMirror`] trait. [`WgpuMirror`] is
//! the production backend over a [`wgpu::Buffer`]; [`NullMirror`] discards
//! traffic for headless use; tests substitute recording implementations.
//!
//! Removal is swap-remove, so positions are not stable identities — see
//! [`SwapRemoved`] for how moves are reported back to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirage::{MirroredVec, WgpuMirror};
//!
//! // device: wgpu::Device, queue: wgpu::Queue
//! let mirror = WgpuMirror::new(
//!     device.clone(),
//!     queue.clone(),
//!     wgpu::BufferUsages::VERTEX,
//!     Some("particles"),
//! );
//! let mut particles = MirroredVec::new(mirror);
//!
//! let p = particles.push(Particle::default())?;
//! particles.set(p, Particle { life: 1.0, ..Default::default() })?;
//! let gone = particles.swap_remove(p)?;
//! ```

pub mod buffer;
pub mod errors;
pub mod mirror;

pub use buffer::{GrowthPolicy, MirroredVec, SwapRemoved};
pub use errors::{BufferError, Result};
pub use mirror::{GpuMirror, NullMirror, WgpuMirror};

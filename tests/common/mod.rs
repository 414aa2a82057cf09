//! Shared test fixtures: a recording GPU mirror and element types.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

use mirage::errors::{BufferError, Result};
use mirage::{GpuMirror, MirroredVec};

/// Recording [`GpuMirror`]: keeps the mirrored bytes in a plain `Vec` and
/// logs every allocation and upload so tests can assert on transfer traffic
/// and on GPU/CPU consistency without a graphics device.
#[derive(Debug, Default)]
pub struct SpyMirror {
    /// The mirrored device bytes.
    pub data: Vec<u8>,
    /// Sizes passed to every reallocating `ensure_size` call.
    pub allocations: Vec<u64>,
    /// `(offset, len)` of every non-empty upload.
    pub uploads: Vec<(u64, usize)>,
    /// When set, the next reallocating `ensure_size` fails once. Shared so
    /// tests can flip it after the buffer has taken ownership of the spy.
    pub fail_next_allocation: Rc<Cell<bool>>,
}

impl SpyMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// A spy plus a handle for injecting a one-shot allocation failure.
    pub fn failable() -> (Self, Rc<Cell<bool>>) {
        let spy = Self::default();
        let switch = Rc::clone(&spy.fail_next_allocation);
        (spy, switch)
    }
}

impl GpuMirror for SpyMirror {
    fn ensure_size(&mut self, size: u64) -> Result<()> {
        if size <= self.data.len() as u64 {
            return Ok(());
        }
        if self.fail_next_allocation.get() {
            self.fail_next_allocation.set(false);
            return Err(BufferError::ResourceExhausted(
                "spy: allocation rejected".to_string(),
            ));
        }
        self.allocations.push(size);
        // Reallocation: contents are undefined afterwards, model that by
        // zero-filling so a missing re-upload shows up in assertions.
        self.data = vec![0; size as usize];
        Ok(())
    }

    fn upload(&mut self, offset: u64, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let start = offset as usize;
        self.uploads.push((offset, bytes.len()));
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

/// Assert the mirrored bytes for the live range equal the CPU store's.
pub fn assert_live_region_matches<T: Pod>(buffer: &MirroredVec<T, SpyMirror>) {
    let live = buffer.as_bytes();
    assert_eq!(
        &buffer.mirror().data[..live.len()],
        live,
        "GPU mirror out of sync with CPU store over the live range"
    );
}

/// A vertex-like element with a realistic GPU layout (32 bytes, no padding).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Sprite {
    pub position: Vec2,
    pub size: Vec2,
    pub color: Vec4,
}

impl Sprite {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::ONE,
            color: Vec4::ONE,
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

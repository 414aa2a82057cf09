//! GPU Mirror Backends
//!
//! The graphics-resource capability behind a [`MirroredVec`]: something that
//! can hold a block of device memory of a requested size and accept byte
//! ranges written into it. The buffer itself never talks to a graphics API
//! directly; it drives one of these.
//!
//! Two implementations ship with the crate:
//! - [`WgpuMirror`] — production backend over a `wgpu` buffer object
//! - [`NullMirror`] — size-tracking no-op for headless use and doc tests
//!
//! Tests typically substitute their own recording implementation to observe
//! transfer traffic.
//!
//! [`MirroredVec`]: crate::buffer::MirroredVec

use crate::errors::{BufferError, Result};

/// Device-side half of a mirrored buffer.
///
/// Implementations own the graphics resource for their whole lifetime:
/// acquired on the first growing [`ensure_size`](GpuMirror::ensure_size)
/// call, released exactly once when the mirror is dropped.
pub trait GpuMirror {
    /// Guarantee device storage of at least `size` bytes.
    ///
    /// A call that grows the storage may reallocate, after which the
    /// contents are undefined; the caller re-uploads the live region.
    /// A call that does not grow must preserve contents.
    ///
    /// Must be atomic: on `Err`, previously held storage and its contents
    /// are intact, and any tentatively created resource has been released.
    fn ensure_size(&mut self, size: u64) -> Result<()>;

    /// Write a contiguous byte range at `offset` into the device storage.
    ///
    /// Only called for ranges within the size last established by a
    /// successful `ensure_size`. Empty ranges are a no-op.
    fn upload(&mut self, offset: u64, bytes: &[u8]);
}

// ============================================================================
// WgpuMirror
// ============================================================================

/// Production [`GpuMirror`] backed by a `wgpu::Buffer`.
///
/// Holds cloned [`wgpu::Device`] and [`wgpu::Queue`] handles; all calls must
/// happen on the thread owning the graphics context. The underlying buffer
/// object is created lazily on first growth and destroyed when the mirror is
/// dropped, so CPU store and GPU object share one lifetime.
///
/// Growth is destroy-and-recreate: the replacement buffer is created before
/// the old one is destroyed, and the caller re-uploads the live region
/// afterwards. Consumers that bind the buffer (bind groups, vertex
/// attachments) must watch the owning buffer's generation counter and rebind
/// after growth.
///
/// `wgpu` validation requires `write_buffer` offsets and sizes to be
/// multiples of [`wgpu::COPY_BUFFER_ALIGNMENT`]; element strides must
/// therefore be a multiple of 4 bytes when using this backend.
pub struct WgpuMirror {
    device: wgpu::Device,
    queue: wgpu::Queue,
    usage: wgpu::BufferUsages,
    label: String,
    buffer: Option<wgpu::Buffer>,
    size: u64,
}

impl WgpuMirror {
    /// Create an empty mirror. No GPU memory is allocated until the owning
    /// buffer first grows.
    ///
    /// `COPY_DST` is forced into `usage` since every synchronization path
    /// goes through `Queue::write_buffer`.
    #[must_use]
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        usage: wgpu::BufferUsages,
        label: Option<&str>,
    ) -> Self {
        Self {
            device,
            queue,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            label: label.unwrap_or("MirroredVec").to_string(),
            buffer: None,
            size: 0,
        }
    }

    /// The underlying buffer object, if one has been allocated yet.
    ///
    /// Used to build bind groups and vertex buffer bindings. The returned
    /// handle dies on the next reallocation.
    #[must_use]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// Currently allocated device size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The usage flags the buffer object is created with.
    #[must_use]
    pub fn usage(&self) -> wgpu::BufferUsages {
        self.usage
    }

    /// The debug label attached to the buffer object.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl GpuMirror for WgpuMirror {
    fn ensure_size(&mut self, size: u64) -> Result<()> {
        let size = size.max(1).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        if size <= self.size && self.buffer.is_some() {
            return Ok(());
        }

        let max_size = self.device.limits().max_buffer_size;
        if size > max_size {
            return Err(BufferError::ResourceExhausted(format!(
                "{}: requested {size} bytes exceeds device max_buffer_size {max_size}",
                self.label
            )));
        }

        log::debug!(
            "Reallocating GPU buffer {:?}: {} -> {} bytes",
            self.label,
            self.size,
            size
        );

        let new_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&self.label),
            size,
            usage: self.usage,
            mapped_at_creation: false,
        });

        if let Some(old) = self.buffer.take() {
            old.destroy();
        }
        self.buffer = Some(new_buffer);
        self.size = size;
        Ok(())
    }

    fn upload(&mut self, offset: u64, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        debug_assert!(
            offset + bytes.len() as u64 <= self.size,
            "upload past end of GPU buffer {:?}",
            self.label
        );
        if let Some(buffer) = &self.buffer {
            self.queue.write_buffer(buffer, offset, bytes);
        }
    }
}

impl Drop for WgpuMirror {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
    }
}

// ============================================================================
// NullMirror
// ============================================================================

/// A [`GpuMirror`] that discards all traffic.
///
/// Useful for headless tools that want the container semantics without a
/// graphics device, and for doc examples.
#[derive(Debug, Default)]
pub struct NullMirror {
    size: u64,
}

impl NullMirror {
    /// Create an empty null mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Size in bytes the mirror pretends to have allocated.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl GpuMirror for NullMirror {
    fn ensure_size(&mut self, size: u64) -> Result<()> {
        self.size = self.size.max(size);
        Ok(())
    }

    fn upload(&mut self, _offset: u64, _bytes: &[u8]) {}
}

//! Dynamic Mirrored Buffer
//!
//! [`MirroredVec`] keeps a densely packed collection of fixed-stride
//! elements in CPU memory and mirrors it into a GPU buffer object through a
//! [`GpuMirror`] backend. The CPU copy is authoritative; every mutation
//! synchronously pushes the minimal changed byte range to the device, so
//! after any successful operation the mirrored bytes for the live range
//! equal the CPU bytes.
//!
//! Removal is swap-remove: O(1), keeps the live range contiguous, but moves
//! the last element into the vacated slot. Positions are therefore not
//! stable identities; [`SwapRemoved::moved_from`] reports which occupant
//! moved so callers holding positions can fix them up.

use bytemuck::Pod;

use crate::errors::{BufferError, Result};
use crate::mirror::GpuMirror;

/// Capacity growth configuration.
///
/// Growth is geometric so repeated appends stay amortized O(1). The exact
/// factor is a policy knob, not a contract; callers should rely only on the
/// amortized behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Capacity allocated by the first growth of an empty buffer.
    pub initial_capacity: usize,
    /// Multiplier applied to the current capacity on growth; clamped to 2.
    pub factor: usize,
}

impl GrowthPolicy {
    /// Create a policy, clamping `factor` to at least 2 and
    /// `initial_capacity` to at least 1.
    #[must_use]
    pub fn new(initial_capacity: usize, factor: usize) -> Self {
        Self {
            initial_capacity: initial_capacity.max(1),
            factor: factor.max(2),
        }
    }

    /// Next capacity for a buffer currently at `current` that must hold at
    /// least `min_total` elements.
    #[must_use]
    pub(crate) fn next_capacity(&self, current: usize, min_total: usize) -> usize {
        current
            .saturating_mul(self.factor)
            .max(self.initial_capacity)
            .max(min_total)
    }
}

impl Default for GrowthPolicy {
    /// Doubling growth with 16 initial slots.
    fn default() -> Self {
        Self::new(16, 2)
    }
}

/// Outcome of [`MirroredVec::swap_remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRemoved<T> {
    /// The element that was removed.
    pub removed: T,
    /// Former position of the element moved into the vacated slot, or
    /// `None` when the removed element was the last one and nothing moved.
    ///
    /// When `Some(old)`, the element previously at `old` now lives at the
    /// removed position; any externally held reference to `old` is stale.
    pub moved_from: Option<usize>,
}

/// A dynamically growable, densely packed element buffer mirrored into GPU
/// memory.
///
/// `T` is a fixed-size plain-old-data record whose meaning the buffer does
/// not interpret; the stride is `size_of::<T>()` for the buffer's lifetime.
/// `M` supplies the device-side storage. Both halves are owned by the value
/// and released together when it is dropped.
///
/// Capacity only ever grows (by [`GrowthPolicy`], or explicitly through
/// [`ensure_capacity`](Self::ensure_capacity)); removal shrinks the live
/// count, never the allocation.
///
/// The `&mut self` receivers encode the single-writer contract: the buffer
/// has exactly one logical owner, and no operation suspends or blocks.
///
/// ```
/// use mirage::{MirroredVec, NullMirror};
///
/// let mut points = MirroredVec::new(NullMirror::new());
/// let a = points.push([0.0f32, 0.0])?;
/// let b = points.push([1.0f32, 0.5])?;
/// assert_eq!((a, b), (0, 1));
/// assert_eq!(points.get(b)?, [1.0, 0.5]);
///
/// let out = points.swap_remove(a)?;
/// assert_eq!(out.removed, [0.0, 0.0]);
/// assert_eq!(out.moved_from, Some(1)); // b now lives at position 0
/// # Ok::<(), mirage::BufferError>(())
/// ```
#[derive(Debug)]
pub struct MirroredVec<T: Pod, M: GpuMirror> {
    store: Vec<T>,
    capacity: usize,
    generation: u64,
    policy: GrowthPolicy,
    mirror: M,
}

impl<T: Pod, M: GpuMirror> MirroredVec<T, M> {
    const STRIDE: usize = std::mem::size_of::<T>();

    /// Create an empty buffer with zero capacity and the default growth
    /// policy. No memory is allocated on either side until the first append.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn new(mirror: M) -> Self {
        Self::with_policy(mirror, GrowthPolicy::default())
    }

    /// Create an empty buffer with a custom growth policy.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn with_policy(mirror: M, policy: GrowthPolicy) -> Self {
        assert!(
            Self::STRIDE > 0,
            "MirroredVec does not support zero-sized element types"
        );
        Self {
            store: Vec::new(),
            capacity: 0,
            generation: 0,
            policy,
            mirror,
        }
    }

    /// Create an empty buffer pre-allocated for at least `capacity`
    /// elements on both sides.
    pub fn with_capacity(mirror: M, capacity: usize) -> Result<Self> {
        let mut buffer = Self::new(mirror);
        buffer.ensure_capacity(capacity)?;
        Ok(buffer)
    }

    // ------------------------------------------------------------------
    // Capacity
    // ------------------------------------------------------------------

    /// Guarantee room for at least `min_total` elements.
    ///
    /// A no-op when the capacity already suffices. Otherwise grows
    /// geometrically (at least `capacity * factor`, at least `min_total`),
    /// preserving all live elements, and re-uploads the full live region to
    /// the freshly allocated device storage in one transfer.
    ///
    /// On [`BufferError::ResourceExhausted`] the buffer is left in its prior
    /// observable state: capacity, count, contents and generation are all
    /// unchanged.
    pub fn ensure_capacity(&mut self, min_total: usize) -> Result<()> {
        if min_total <= self.capacity {
            return Ok(());
        }
        self.grow_to(min_total)
    }

    fn grow_to(&mut self, min_total: usize) -> Result<()> {
        let new_capacity = self.policy.next_capacity(self.capacity, min_total);
        let new_bytes = new_capacity
            .checked_mul(Self::STRIDE)
            .ok_or_else(|| BufferError::ResourceExhausted(format!(
                "byte size overflow growing to {new_capacity} elements"
            )))?;

        // CPU half first; Vec keeps the live elements either way.
        self.store
            .try_reserve_exact(new_capacity - self.store.len())
            .map_err(|e| BufferError::ResourceExhausted(e.to_string()))?;

        // Device half second. On failure nothing observable has changed:
        // the extra CPU reservation is hidden behind `capacity`.
        self.mirror.ensure_size(new_bytes as u64)?;
        self.mirror.upload(0, bytemuck::cast_slice(&self.store));

        log::debug!(
            "Mirrored buffer grown: {} -> {} elements ({} live)",
            self.capacity,
            new_capacity,
            self.store.len()
        );

        self.capacity = new_capacity;
        self.generation = self.generation.wrapping_add(1);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Element CRUD
    // ------------------------------------------------------------------

    /// Append one element, growing by policy when full, and upload exactly
    /// the written slot. Returns the assigned position (the old count).
    pub fn push(&mut self, value: T) -> Result<usize> {
        if self.store.len() == self.capacity {
            self.grow_to(self.capacity + 1)?;
        }
        let position = self.store.len();
        self.store.push(value);
        self.upload_slot(position);
        Ok(position)
    }

    /// Append a contiguous block of elements, uploading the appended range
    /// in a single transfer. Returns the start position of the block; an
    /// empty slice is a no-op returning the current count.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<usize> {
        let start = self.store.len();
        if values.is_empty() {
            return Ok(start);
        }
        let required = start.checked_add(values.len()).ok_or_else(|| {
            BufferError::ResourceExhausted("element count overflow".to_string())
        })?;
        self.ensure_capacity(required)?;

        self.store.extend_from_slice(values);
        self.mirror
            .upload((start * Self::STRIDE) as u64, bytemuck::cast_slice(values));
        Ok(start)
    }

    /// Copy out the element at `position`.
    ///
    /// Reads only the CPU store, never the device; the CPU copy is
    /// authoritative between synchronization points.
    pub fn get(&self, position: usize) -> Result<T> {
        self.check_position(position)?;
        Ok(self.store[position])
    }

    /// Replace the element at `position` and upload the one changed slot.
    pub fn set(&mut self, position: usize, value: T) -> Result<()> {
        self.check_position(position)?;
        self.store[position] = value;
        self.upload_slot(position);
        Ok(())
    }

    /// Remove the element at `position` by moving the last live element
    /// into its slot, keeping the live range contiguous in O(1).
    ///
    /// Only the changed slot is uploaded; the vacated tail slot goes stale
    /// on both sides but sits outside the live range. The returned
    /// [`SwapRemoved::moved_from`] names the displaced element's former
    /// position so callers can patch any references they hold.
    pub fn swap_remove(&mut self, position: usize) -> Result<SwapRemoved<T>> {
        self.check_position(position)?;
        let removed = self.store.swap_remove(position);
        let moved_from = if position < self.store.len() {
            self.upload_slot(position);
            Some(self.store.len())
        } else {
            None
        };
        Ok(SwapRemoved { removed, moved_from })
    }

    /// Drop all live elements. Capacity and device storage are untouched;
    /// the stale device bytes sit outside the now-empty live range.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the buffer holds no live elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Allocated slots on both sides; never less than [`len`](Self::len),
    /// never shrinks.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte size of one element slot.
    #[must_use]
    pub fn stride(&self) -> usize {
        Self::STRIDE
    }

    /// Reallocation counter for the device storage.
    ///
    /// Bumped every time growth replaces the underlying device buffer.
    /// Anything that binds the device buffer (bind groups, vertex
    /// attachments) records the generation it bound against and rebinds
    /// when the counter moves on.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The growth policy in effect.
    #[must_use]
    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// The live elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.store
    }

    /// The live elements as raw bytes (`len * stride` of them).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.store)
    }

    /// Shared access to the device-side backend, e.g. to fetch the
    /// underlying `wgpu::Buffer` for binding.
    #[must_use]
    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check_position(&self, position: usize) -> Result<()> {
        if position < self.store.len() {
            Ok(())
        } else {
            Err(BufferError::OutOfRange {
                position,
                count: self.store.len(),
            })
        }
    }

    fn upload_slot(&mut self, position: usize) {
        self.mirror.upload(
            (position * Self::STRIDE) as u64,
            bytemuck::bytes_of(&self.store[position]),
        );
    }
}

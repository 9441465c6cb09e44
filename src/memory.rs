//! Memory blocks: contiguous, possibly dual-resident element buffers.
//!
//! A [`MemoryBlock`] owns a host buffer and, once the accelerator side has
//! been touched, a mirror of the same length. Which side is authoritative is
//! an explicit [`Residency`] state; it only changes through the accessor
//! methods, so kernels never synchronize behind the caller's back.
//!
//! | State         | `host()`          | `device()`        | `*_mut()` afterwards |
//! |---------------|-------------------|-------------------|----------------------|
//! | `HostValid`   | direct            | copy host→device  | side written is valid|
//! | `DeviceValid` | copy device→host  | direct            | side written is valid|
//! | `BothValid`   | direct            | direct            | side written is valid|
//!
//! Blocks are shared between matrix views through [`SharedBlock`]; the last
//! view dropped frees the buffer.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::scalar::Scalar;
use parking_lot::RwLock;
use std::sync::Arc;

/// Reference-counted, lock-protected block shared by matrix views.
pub type SharedBlock<T> = Arc<RwLock<MemoryBlock<T>>>;

/// Which copy of a block holds the current data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Residency {
    /// Only the host buffer is current.
    HostValid,
    /// Only the accelerator mirror is current.
    DeviceValid,
    /// Both copies hold the same data.
    BothValid,
}

/// A contiguous buffer of `T` with host and accelerator residencies.
#[derive(Debug, Clone)]
pub struct MemoryBlock<T> {
    host: Vec<T>,
    device: Option<Vec<T>>,
    residency: Residency,
    used: usize,
}

fn try_zeroed<T: Scalar>(len: usize) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed {
            elements: len,
            bytes: len.saturating_mul(core::mem::size_of::<T>()),
        })?;
    data.resize(len, T::zero());
    Ok(data)
}

impl<T: Scalar> MemoryBlock<T> {
    /// Allocates a zero-initialized block of `len` elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] when the memory cannot be obtained.
    pub fn allocate(len: usize) -> Result<Self> {
        let host = try_zeroed(len)?;
        tracing::debug!(len, ty = T::TYPE.name(), "allocated memory block");
        Ok(Self::from_vec(host))
    }

    /// Wraps an existing host buffer.
    #[must_use]
    pub fn from_vec(host: Vec<T>) -> Self {
        let used = host.len();
        Self {
            host,
            device: None,
            residency: Residency::HostValid,
            used,
        }
    }

    /// Logical number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.used
    }

    /// Returns `true` if the block holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Allocated number of elements.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.host.len()
    }

    /// Current residency state.
    #[must_use]
    pub const fn residency(&self) -> Residency {
        self.residency
    }

    /// Returns `true` once an accelerator mirror exists.
    #[must_use]
    pub const fn has_device_mirror(&self) -> bool {
        self.device.is_some()
    }

    /// Reads whichever copy is authoritative without synchronizing.
    #[must_use]
    pub fn authoritative(&self) -> &[T] {
        match (&self.device, self.residency) {
            (Some(device), Residency::DeviceValid) => &device[..self.used],
            _ => &self.host[..self.used],
        }
    }

    fn sync_to_host(&mut self) {
        if self.residency == Residency::DeviceValid {
            if let Some(device) = &self.device {
                self.host.copy_from_slice(device);
            }
            tracing::trace!(len = self.host.len(), "device -> host sync");
            self.residency = Residency::BothValid;
        }
    }

    fn sync_to_device(&mut self) {
        if self.device.is_none() {
            self.device = Some(self.host.clone());
            tracing::trace!(len = self.host.len(), "device mirror created");
            self.residency = Residency::BothValid;
            return;
        }
        if self.residency == Residency::HostValid {
            if let Some(device) = &mut self.device {
                device.copy_from_slice(&self.host);
            }
            tracing::trace!(len = self.host.len(), "host -> device sync");
            self.residency = Residency::BothValid;
        }
    }

    /// Read access to the host copy, synchronizing it first if stale.
    pub fn host(&mut self) -> &[T] {
        self.sync_to_host();
        &self.host[..self.used]
    }

    /// Write access to the host copy; the accelerator copy becomes stale.
    pub fn host_mut(&mut self) -> &mut [T] {
        self.sync_to_host();
        if self.device.is_some() {
            self.residency = Residency::HostValid;
        }
        &mut self.host[..self.used]
    }

    /// Read access to the accelerator copy, synchronizing it first if stale.
    pub fn device(&mut self) -> &[T] {
        self.sync_to_device();
        match &self.device {
            Some(device) => &device[..self.used],
            None => &self.host[..self.used],
        }
    }

    /// Write access to the accelerator copy; the host copy becomes stale.
    pub fn device_mut(&mut self) -> &mut [T] {
        self.sync_to_device();
        self.residency = Residency::DeviceValid;
        match &mut self.device {
            Some(device) => &mut device[..self.used],
            None => &mut self.host[..self.used],
        }
    }

    /// Read access on the side selected by `backend`.
    pub fn slice(&mut self, backend: Backend) -> &[T] {
        match backend {
            Backend::Cpu => self.host(),
            Backend::Accelerator => self.device(),
        }
    }

    /// Write access on the side selected by `backend`.
    pub fn slice_mut(&mut self, backend: Backend) -> &mut [T] {
        match backend {
            Backend::Cpu => self.host_mut(),
            Backend::Accelerator => self.device_mut(),
        }
    }

    /// Changes the logical length to `len`.
    ///
    /// A length within capacity reuses the buffer and only moves the logical
    /// end; elements past the old end keep whatever they held. A larger
    /// length reallocates and keeps the first `min(old, new)` elements; the
    /// result is host resident.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] when growing fails.
    pub fn resize(&mut self, len: usize) -> Result<()> {
        if len <= self.capacity() {
            self.used = len;
            return Ok(());
        }
        self.sync_to_host();
        let mut host = try_zeroed(len)?;
        let keep = self.used.min(len);
        host[..keep].copy_from_slice(&self.host[..keep]);
        tracing::debug!(from = self.used, to = len, "memory block reallocated");
        self.host = host;
        self.device = None;
        self.residency = Residency::HostValid;
        self.used = len;
        Ok(())
    }

    /// Wraps the block for sharing between views.
    #[must_use]
    pub fn into_shared(self) -> SharedBlock<T> {
        Arc::new(RwLock::new(self))
    }
}

//! Device resource manager: capacity-bounded acquisition for the five device kinds.

pub mod semaphore;

use semaphore::CountingSemaphore;

use crate::common::error::RuntimeError;

/// The five device kinds a meta-data instruction can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Counting semaphore, capacity = `Config.hard_drive_quantity`.
    Hdd,
    /// Counting semaphore, capacity = `Config.projector_quantity`.
    Projector,
    /// Mutual-exclusion lock, capacity 1.
    Keyboard,
    /// Mutual-exclusion lock, capacity 1.
    Scanner,
    /// Mutual-exclusion lock, capacity 1.
    Monitor,
}

impl DeviceKind {
    /// Maps an `(code, descriptor)` meta-data token to the device it addresses.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::UnknownDeviceKind`] if the descriptor is not one of the
    /// recognized device names. Callers should only reach this after the meta-data
    /// parser has already validated the descriptor against its code's vocabulary.
    pub fn from_descriptor(descriptor: &str) -> Result<Self, RuntimeError> {
        match descriptor {
            "hard drive" => Ok(Self::Hdd),
            "projector" => Ok(Self::Projector),
            "keyboard" => Ok(Self::Keyboard),
            "scanner" => Ok(Self::Scanner),
            "monitor" => Ok(Self::Monitor),
            other => Err(RuntimeError::UnknownDeviceKind(other.to_string())),
        }
    }
}

/// Owns one semaphore per device kind for the lifetime of a simulation run.
#[derive(Debug)]
pub struct ResourceManager {
    hdd: CountingSemaphore,
    projector: CountingSemaphore,
    keyboard: CountingSemaphore,
    scanner: CountingSemaphore,
    monitor: CountingSemaphore,
}

impl ResourceManager {
    /// Creates a resource manager sized from the configured device quantities.
    #[must_use]
    pub fn new(hard_drive_quantity: u32, projector_quantity: u32) -> Self {
        Self {
            hdd: CountingSemaphore::new(hard_drive_quantity),
            projector: CountingSemaphore::new(projector_quantity),
            keyboard: CountingSemaphore::new(1),
            scanner: CountingSemaphore::new(1),
            monitor: CountingSemaphore::new(1),
        }
    }

    fn semaphore(&self, kind: DeviceKind) -> &CountingSemaphore {
        match kind {
            DeviceKind::Hdd => &self.hdd,
            DeviceKind::Projector => &self.projector,
            DeviceKind::Keyboard => &self.keyboard,
            DeviceKind::Scanner => &self.scanner,
            DeviceKind::Monitor => &self.monitor,
        }
    }

    /// The configured capacity for `kind`, used to compute `used mod capacity`.
    #[must_use]
    pub fn capacity(&self, kind: DeviceKind) -> u32 {
        self.semaphore(kind).capacity()
    }

    /// Blocks the calling thread until `kind` has a free instance, then checks it out.
    /// Returns a guard that releases it on drop — the process releases on every exit
    /// path, including cancellation, without the caller needing to remember to.
    #[must_use]
    pub fn acquire(&self, kind: DeviceKind) -> DeviceGuard<'_> {
        self.semaphore(kind).acquire();
        DeviceGuard { manager: self, kind }
    }
}

/// RAII handle to a checked-out device instance.
#[derive(Debug)]
pub struct DeviceGuard<'a> {
    manager: &'a ResourceManager,
    kind: DeviceKind,
}

impl Drop for DeviceGuard<'_> {
    fn drop(&mut self) {
        self.manager.semaphore(self.kind).release();
    }
}

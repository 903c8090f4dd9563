use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

/// An opaque identifier for a serial.
///
/// Serials are never zero.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Serial(NonZeroU32);

impl Serial {
    /// Construct a serial from a raw value, returning `None` for zero.
    #[inline]
    pub const fn new(serial: u32) -> Option<Self> {
        match NonZeroU32::new(serial) {
            Some(serial) => Some(Self(serial)),
            None => None,
        }
    }

    /// Get the raw value of the serial.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Serial {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Serial {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

/// Allocates serials for outgoing messages.
///
/// Serials start at 1 and wrap around without ever producing 0. Allocation is
/// lock-free, so one allocator can be shared between threads.
///
/// # Examples
///
/// ```
/// use tokio_dbus_engine::SerialAllocator;
///
/// let serials = SerialAllocator::new();
/// assert_eq!(serials.next().get(), 1);
/// assert_eq!(serials.next().get(), 2);
/// ```
#[derive(Debug)]
pub struct SerialAllocator {
    next: AtomicU32,
}

impl SerialAllocator {
    /// Construct a new allocator starting at 1.
    #[inline]
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Construct a new allocator which hands out `serial` first.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokio_dbus_engine::{Serial, SerialAllocator};
    ///
    /// let serials = SerialAllocator::starting_at(Serial::new(u32::MAX).unwrap());
    /// assert_eq!(serials.next().get(), u32::MAX);
    /// assert_eq!(serials.next().get(), 1);
    /// ```
    #[inline]
    pub const fn starting_at(serial: Serial) -> Self {
        Self {
            next: AtomicU32::new(serial.get()),
        }
    }

    /// Allocate the next serial.
    pub fn next(&self) -> Serial {
        let current = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(match n.wrapping_add(1) {
                    0 => 1,
                    n => n,
                })
            })
            .unwrap_or_else(|n| n);

        // The stored value only ever starts at or advances to non-zero values.
        Serial(NonZeroU32::new(current).unwrap_or(NonZeroU32::MIN))
    }
}

impl Default for SerialAllocator {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

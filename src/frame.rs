use crate::proto::Endianness;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// A fixed-size primitive that can be stored to and loaded from a buffer in
/// either byte order.
///
/// This is implemented for the numeric wire primitives such as `u32`.
pub trait Frame: Copy + self::sealed::Sealed {
    /// The size of the frame, which is also its wire alignment.
    #[doc(hidden)]
    const SIZE: usize;

    /// Append the frame to `out` in the given byte order.
    #[doc(hidden)]
    fn store(self, endianness: Endianness, out: &mut Vec<u8>);

    /// Overwrite `out` with the frame in the given byte order.
    ///
    /// `out` must be exactly [`Frame::SIZE`] bytes long.
    #[doc(hidden)]
    fn store_at(self, endianness: Endianness, out: &mut [u8]);

    /// Load the frame from the front of `bytes`, which must hold at least
    /// [`Frame::SIZE`] bytes.
    #[doc(hidden)]
    fn load(bytes: &[u8], endianness: Endianness) -> Option<Self>;
}

macro_rules! impl_frame {
    ($($ty:ty),* $(,)?) => {
        $(
            impl self::sealed::Sealed for $ty {}

            impl Frame for $ty {
                const SIZE: usize = ::core::mem::size_of::<$ty>();

                #[inline]
                fn store(self, endianness: Endianness, out: &mut Vec<u8>) {
                    if endianness == Endianness::BIG {
                        out.extend_from_slice(&self.to_be_bytes());
                    } else {
                        out.extend_from_slice(&self.to_le_bytes());
                    }
                }

                #[inline]
                fn store_at(self, endianness: Endianness, out: &mut [u8]) {
                    if endianness == Endianness::BIG {
                        out.copy_from_slice(&self.to_be_bytes());
                    } else {
                        out.copy_from_slice(&self.to_le_bytes());
                    }
                }

                #[inline]
                fn load(bytes: &[u8], endianness: Endianness) -> Option<Self> {
                    let bytes = bytes.get(..Self::SIZE)?;
                    let mut raw = [0u8; ::core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);

                    Some(if endianness == Endianness::BIG {
                        <$ty>::from_be_bytes(raw)
                    } else {
                        <$ty>::from_le_bytes(raw)
                    })
                }
            }
        )*
    }
}

impl_frame!(u8, i16, i32, i64, u16, u32, u64, f64);

//! A growable byte buffer with power-of-two capacity growth.

use crate::error::Error;
use core::fmt;
use core::ops::Deref;

/// The capacity of a buffer after its first growth.
const INITIAL_CAPACITY: usize = 4;

/// An owned, growable array of bytes.
/// Capacity only grows, and always to a power of two. Allocation failure is
/// reported as an error rather than aborting.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteBuf {
    data: Vec<u8>,
}

impl ByteBuf {
    /// Construct an empty buffer. No allocation is performed until the first
    /// byte is appended.
    pub fn new() -> ByteBuf {
        ByteBuf { data: Vec::new() }
    }

    /// Construct a buffer holding a copy of \p bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<ByteBuf, Error> {
        let mut buf = ByteBuf::new();
        buf.extend_from_slice(bytes)?;
        Ok(buf)
    }

    /// \return the number of bytes stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// \return whether no bytes are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// \return the number of bytes that fit before the next growth.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// \return the stored bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Ensure there is room for \p required bytes in total.
    /// On growth the capacity becomes the next power of two covering
    /// \p required.
    fn grow_to(&mut self, required: usize) -> Result<(), Error> {
        if required <= self.data.capacity() {
            return Ok(());
        }
        let new_cap = required
            .max(INITIAL_CAPACITY)
            .checked_next_power_of_two()
            .ok_or(Error::ResourceExhausted)?;
        self.data.try_reserve_exact(new_cap - self.data.len())?;
        Ok(())
    }

    /// Append a single byte. Amortized O(1).
    pub fn push(&mut self, b: u8) -> Result<(), Error> {
        let required = self.data.len().checked_add(1).ok_or(Error::ResourceExhausted)?;
        self.grow_to(required)?;
        self.data.push(b);
        Ok(())
    }

    /// Append every byte of \p bytes.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let required = self
            .data
            .len()
            .checked_add(bytes.len())
            .ok_or(Error::ResourceExhausted)?;
        self.grow_to(required)?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }
}

impl Deref for ByteBuf {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for ByteBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"{}\"", self.data.escape_ascii())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_does_not_allocate() {
        let buf = ByteBuf::new();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn capacity_doubles() {
        let mut buf = ByteBuf::new();
        let mut seen = Vec::new();
        for b in 0..40u8 {
            buf.push(b).unwrap();
            assert!(buf.capacity() >= buf.len());
            assert!(buf.capacity().is_power_of_two());
            if seen.last() != Some(&buf.capacity()) {
                seen.push(buf.capacity());
            }
        }
        assert_eq!(seen, vec![4, 8, 16, 32, 64]);
        assert_eq!(buf.as_slice(), (0..40u8).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn extend_covers_required_length() {
        let mut buf = ByteBuf::from_slice(b"ab").unwrap();
        buf.extend_from_slice(&[b'x'; 13]).unwrap();
        assert_eq!(buf.len(), 15);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(&buf[..3], b"abx");
    }

    #[test]
    fn debug_escapes() {
        let buf = ByteBuf::from_slice(b"a\n").unwrap();
        assert_eq!(format!("{:?}", buf), "b\"a\\n\"");
    }
}

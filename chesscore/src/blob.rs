//! [`Blob`]: an owned-or-borrowed contiguous byte buffer, the storage
//! substrate for [`crate::bitstream::Bitstream`].

use crate::error::{ChessError, Result};

enum Storage<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a [u8]),
}

/// A byte buffer that is either owned (growable, writable) or a borrowed
/// read-only view. The ownership flag never changes after construction.
pub struct Blob<'a> {
    storage: Storage<'a>,
    length: usize,
}

impl<'a> Blob<'a> {
    /// A new, empty, owned blob.
    pub fn new_owned() -> Blob<'static> {
        Blob {
            storage: Storage::Owned(Vec::new()),
            length: 0,
        }
    }

    /// Wraps `data` as a read-only, borrowed view. Never reallocates;
    /// `append`/`reserve`/`truncate`-growing all fail on a borrowed blob.
    pub fn wrap_borrowed(data: &'a [u8]) -> Blob<'a> {
        Blob {
            length: data.len(),
            storage: Storage::Borrowed(data),
        }
    }

    /// Builds an owned blob from a copy of `data`.
    pub fn copy_from(data: &[u8]) -> Blob<'static> {
        Blob {
            length: data.len(),
            storage: Storage::Owned(data.to_vec()),
        }
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Owned(v) => v.len(),
            Storage::Borrowed(s) => s.len(),
        }
    }

    /// The logical contents: `storage[0..length]`. Bytes beyond `length`
    /// but within capacity (reachable only on an owned blob after
    /// `reserve`) always read as zero, per the documented resolution of the
    /// upstream open question about unused reserved bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(v) => &v[..self.length],
            Storage::Borrowed(s) => &s[..self.length],
        }
    }

    /// Grows owned backing storage so `capacity() >= n`, zero-filling the
    /// new bytes. A no-op when `n <= capacity()`. Errors on a borrowed blob.
    pub fn reserve(&mut self, n: usize) -> Result<()> {
        if n <= self.capacity() {
            return Ok(());
        }
        match &mut self.storage {
            Storage::Owned(v) => {
                v.resize(n, 0);
                Ok(())
            }
            Storage::Borrowed(_) => Err(ChessError::invalid("cannot reserve on a borrowed blob")),
        }
    }

    /// Appends `data`, growing backing storage as needed. Errors on a
    /// borrowed blob.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        match &mut self.storage {
            Storage::Owned(v) => {
                if self.length == v.len() {
                    v.extend_from_slice(data);
                } else {
                    v.truncate(self.length);
                    v.extend_from_slice(data);
                }
                self.length += data.len();
                Ok(())
            }
            Storage::Borrowed(_) => Err(ChessError::invalid("cannot append to a borrowed blob")),
        }
    }

    /// Sets the logical length to `len`, which must not exceed capacity.
    pub fn truncate(&mut self, len: usize) -> Result<()> {
        if len > self.capacity() {
            return Err(ChessError::invalid("truncate length exceeds capacity"));
        }
        self.length = len;
        Ok(())
    }

    /// Reads a single byte at `idx`, which must be within `length`.
    pub fn get(&self, idx: usize) -> Option<u8> {
        if idx >= self.length {
            return None;
        }
        Some(self.as_bytes()[idx])
    }

    /// Ensures the logical length covers `idx`, growing with zero bytes as
    /// needed, then ORs `mask` into that byte. Used by
    /// [`crate::bitstream::Bitstream`]'s writer, which appends bytes lazily
    /// as the cursor advances. Errors on a borrowed blob.
    pub(crate) fn or_byte_at(&mut self, idx: usize, mask: u8) -> Result<()> {
        match &mut self.storage {
            Storage::Owned(v) => {
                if idx >= v.len() {
                    v.resize(idx + 1, 0);
                }
                v[idx] |= mask;
                if idx + 1 > self.length {
                    self.length = idx + 1;
                }
                Ok(())
            }
            Storage::Borrowed(_) => Err(ChessError::invalid("cannot write to a borrowed blob")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_append_and_reserve() {
        let mut b = Blob::new_owned();
        b.append(&[1, 2, 3]).unwrap();
        assert_eq!(b.as_bytes(), &[1, 2, 3]);
        b.reserve(8).unwrap();
        assert_eq!(b.len(), 3);
        assert!(b.capacity() >= 8);
    }

    #[test]
    fn borrowed_is_read_only() {
        let data = [9u8, 8, 7];
        let mut b = Blob::wrap_borrowed(&data);
        assert!(!b.is_owned());
        assert_eq!(b.as_bytes(), &data);
        assert!(b.append(&[1]).is_err());
        assert!(b.reserve(16).is_err());
    }

    #[test]
    fn truncate_within_capacity_ok() {
        let mut b = Blob::new_owned();
        b.append(&[1, 2, 3, 4]).unwrap();
        b.truncate(2).unwrap();
        assert_eq!(b.as_bytes(), &[1, 2]);
        assert!(b.truncate(100).is_err());
    }
}

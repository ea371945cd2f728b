//! Byte sources that records are read from.
//!
//! All positions are counted from where the source stood when it was wrapped, so a
//! record's offsets mean the same thing whether the input was buffered in memory or not.

use std::{
    borrow::Cow,
    io::{self, Read, Seek, SeekFrom},
};

use tracing::warn;

use crate::errors::ReadError;

/// Cursor-based access to a byte source.
pub trait Stream {
    /// Current read position.
    fn position(&self) -> u64;

    /// Total number of readable bytes, or `None` if unknown (forward-only sources).
    fn total_len(&self) -> Option<u64>;

    /// Moves the cursor to `pos`. On failure the cursor does not move.
    fn seek_to(&mut self, pos: u64) -> Result<(), ReadError>;

    /// Fills `buf` from the cursor and advances past it. On failure the cursor does not move.
    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), ReadError>;

    /// Reads `len` bytes into a new buffer. Nothing is allocated for bytes the stream
    /// cannot supply.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ReadError> {
        let needed = len as u64;
        if let Some(total) = self.total_len() {
            if total.saturating_sub(self.position()) < needed {
                return Err(ReadError::UnexpectedEndOfStream {
                    offset: self.position(),
                    needed,
                });
            }
        }

        let mut buf = vec![0u8; len];
        self.read_exact_into(&mut buf)?;
        Ok(buf)
    }
}

/// A stream over bytes held in memory.
#[derive(Debug, Clone)]
pub struct MemoryStream<'a> {
    data: Cow<'a, [u8]>,
    pos: u64,
}

impl<'a> MemoryStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data: Cow::Borrowed(data),
            pos: 0,
        }
    }

    pub fn from_vec(data: Vec<u8>) -> MemoryStream<'static> {
        MemoryStream {
            data: Cow::Owned(data),
            pos: 0,
        }
    }
}

impl Stream for MemoryStream<'_> {
    fn position(&self) -> u64 {
        self.pos
    }

    fn total_len(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn seek_to(&mut self, pos: u64) -> Result<(), ReadError> {
        let len = self.data.len() as u64;
        if pos > len {
            return Err(ReadError::OffsetOutOfRange {
                target: pos.into(),
                len,
            });
        }

        self.pos = pos;
        Ok(())
    }

    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        let start = self.pos as usize;
        let end = start
            .checked_add(buf.len())
            .filter(|end| *end <= self.data.len())
            .ok_or(ReadError::UnexpectedEndOfStream {
                offset: self.pos,
                needed: buf.len() as u64,
            })?;

        buf.copy_from_slice(&self.data[start..end]);
        self.pos = end as u64;
        Ok(())
    }
}

/// A stream that reads directly from a seekable source without buffering it.
#[derive(Debug)]
pub struct SeekStream<R> {
    inner: R,
    base: u64,
    pos: u64,
    len: u64,
}

impl<R: Read + Seek> SeekStream<R> {
    /// Wraps `inner`, treating its current position as position 0.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let base = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(base))?;

        Ok(Self {
            inner,
            base,
            pos: 0,
            len: end.saturating_sub(base),
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> Stream for SeekStream<R> {
    fn position(&self) -> u64 {
        self.pos
    }

    fn total_len(&self) -> Option<u64> {
        Some(self.len)
    }

    fn seek_to(&mut self, pos: u64) -> Result<(), ReadError> {
        if pos > self.len {
            return Err(ReadError::OffsetOutOfRange {
                target: pos.into(),
                len: self.len,
            });
        }

        self.inner.seek(SeekFrom::Start(self.base + pos))?;
        self.pos = pos;
        Ok(())
    }

    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        let needed = buf.len() as u64;
        if self.len.saturating_sub(self.pos) < needed {
            return Err(ReadError::UnexpectedEndOfStream {
                offset: self.pos,
                needed,
            });
        }

        if let Err(err) = self.inner.read_exact(buf) {
            if let Err(seek_err) = self.inner.seek(SeekFrom::Start(self.base + self.pos)) {
                warn!(error = %seek_err, pos = self.pos, "failed to rewind after short read");
            }
            return Err(err.into());
        }

        self.pos += needed;
        Ok(())
    }
}

/// A forward-only stream over any reader. Only sequential reads are possible.
#[derive(Debug)]
pub struct ForwardStream<R> {
    inner: R,
    pos: u64,
}

impl<R: Read> ForwardStream<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }
}

impl<R: Read> Stream for ForwardStream<R> {
    fn position(&self) -> u64 {
        self.pos
    }

    fn total_len(&self) -> Option<u64> {
        None
    }

    fn seek_to(&mut self, pos: u64) -> Result<(), ReadError> {
        if pos == self.pos {
            return Ok(());
        }

        Err(ReadError::SeekUnsupported)
    }

    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            // Bytes consumed by a short read are gone; the logical cursor stays put.
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                Err(ReadError::UnexpectedEndOfStream {
                    offset: self.pos,
                    needed: buf.len() as u64,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ReadError> {
        let needed = len as u64;
        let mut buf = Vec::new();
        (&mut self.inner).take(needed).read_to_end(&mut buf)?;

        if buf.len() < len {
            return Err(ReadError::UnexpectedEndOfStream {
                offset: self.pos,
                needed,
            });
        }

        self.pos += needed;
        Ok(buf)
    }
}

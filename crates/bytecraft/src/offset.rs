//! Reads at explicit offsets that leave the stream cursor where it was.

use std::sync::Arc;

use tracing::trace;

use crate::{
    endian::ByteOrder,
    errors::{ParseError, ReadError},
    primitive::Primitive,
    schema::Schema,
    stream::Stream,
    value::Value,
};

/// What [read_at] reads at the target position.
#[derive(Debug, Clone, Copy)]
pub enum ReadTarget<'s> {
    /// A primitive, decoded under the given byte order.
    Primitive(Primitive, ByteOrder),
    /// A record, decoded under its schema's own policies. Its origin is the target position.
    Record(&'s Schema),
}

impl ReadTarget<'_> {
    /// Fewest bytes a read of this target can consume.
    fn min_len(&self) -> u64 {
        match self {
            ReadTarget::Primitive(p, _) => p.size() as u64,
            ReadTarget::Record(schema) => schema.min_len(),
        }
    }

    fn read(&self, stream: &mut dyn Stream, args: &[Value]) -> Result<Value, ParseError> {
        match self {
            ReadTarget::Primitive(p, order) => {
                if !args.is_empty() {
                    return Err(ReadError::ArgumentCount {
                        expected: 0,
                        given: args.len(),
                    }
                    .into());
                }

                Ok(p.read(stream, *order)?)
            }
            ReadTarget::Record(schema) => schema.read(stream, args).map(Value::Record),
        }
    }
}

impl<'s> From<&'s Schema> for ReadTarget<'s> {
    fn from(schema: &'s Schema) -> Self {
        ReadTarget::Record(schema)
    }
}

impl<'s> From<&'s Arc<Schema>> for ReadTarget<'s> {
    fn from(schema: &'s Arc<Schema>) -> Self {
        ReadTarget::Record(schema)
    }
}

/// Reads `target` at `start + offset` without moving the cursor.
///
/// `start` defaults to the current position; pass a record's origin for offsets relative
/// to that record, or `Some(0)` for absolute offsets. If the target position, or the
/// primitive read there, runs past the end of the stream, this fails with
/// [ReadError::OffsetOutOfRange] before anything is read. For records only the leading
/// primitive fields are checked up front; a record whose later fields run short fails with
/// [ReadError::UnexpectedEndOfStream] from the nested read. Streams that cannot seek fail
/// with [ReadError::SeekUnsupported]. The cursor is restored on every path.
pub fn read_at<'s>(
    stream: &mut dyn Stream,
    target: impl Into<ReadTarget<'s>>,
    offset: i64,
    start: Option<u64>,
    args: &[Value],
) -> Result<Value, ParseError> {
    let target = target.into();
    let base = start.unwrap_or_else(|| stream.position());
    let pos = locate(&*stream, base, offset, target.min_len())?;

    trace!(base, offset, pos, "offset read");

    restoring_cursor(stream, |stream| {
        stream.seek_to(pos)?;
        target.read(stream, args)
    })
}

/// Runs `f`, then puts the cursor back where it was, whether `f` succeeded or not.
///
/// An error from `f` takes precedence over a failure to restore.
pub fn restoring_cursor<T>(
    stream: &mut dyn Stream,
    f: impl FnOnce(&mut dyn Stream) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    let saved = stream.position();
    let result = f(&mut *stream);
    settle(result, stream.seek_to(saved))
}

pub(crate) fn settle<T>(
    result: Result<T, ParseError>,
    restored: Result<(), ReadError>,
) -> Result<T, ParseError> {
    match (result, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(err), _) => Err(err),
        (Ok(_), Err(err)) => Err(err.into()),
    }
}

fn locate(stream: &dyn Stream, base: u64, offset: i64, min_len: u64) -> Result<u64, ReadError> {
    let Some(len) = stream.total_len() else {
        return Err(ReadError::SeekUnsupported);
    };

    let target = i128::from(base) + i128::from(offset);
    if target < 0 || target + i128::from(min_len) > i128::from(len) {
        return Err(ReadError::OffsetOutOfRange { target, len });
    }

    u64::try_from(target).map_err(|_| ReadError::OffsetOutOfRange { target, len })
}

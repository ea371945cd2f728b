//! Resolution of field directives into values.

use tracing::trace;

use crate::{
    endian::ByteOrder,
    env::Env,
    errors::{ParseError, ReadError},
    field::{CursorPolicy, Directive, FieldType},
    offset::{self, ReadTarget},
    primitive::Primitive,
    schema::Schema,
    stream::Stream,
    value::{Record, Value},
};

/// Upper bound on elements reserved up front for a collection, whatever its declared length.
const MAX_PREALLOC: usize = 4096;

/// Everything a directive can see while one field of a record is read.
///
/// Custom read procedures receive this: the stream, the bindings made so far, the origin of
/// the enclosing record and that record's byte order.
pub struct ReadContext<'a> {
    stream: &'a mut dyn Stream,
    env: &'a Env,
    origin: u64,
    byte_order: ByteOrder,
}

impl<'a> ReadContext<'a> {
    pub(crate) fn new(
        stream: &'a mut dyn Stream,
        env: &'a Env,
        origin: u64,
        byte_order: ByteOrder,
    ) -> Self {
        ReadContext {
            stream,
            env,
            origin,
            byte_order,
        }
    }

    pub fn env(&self) -> &Env {
        self.env
    }

    /// Value bound to an earlier field or extra argument.
    pub fn get(&self, name: &str) -> Result<&Value, ReadError> {
        self.env.require(name)
    }

    pub fn integer(&self, name: &str) -> Result<i128, ReadError> {
        self.env.integer(name)
    }

    pub fn array(&self, name: &str) -> Result<&[Value], ReadError> {
        self.env.array(name)
    }

    /// Position of the first byte of the record being read.
    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Direct access to the stream. Cursor movement made through it follows the
    /// directive's [CursorPolicy].
    pub fn stream(&mut self) -> &mut dyn Stream {
        &mut *self.stream
    }

    /// Reads a primitive at the cursor under the record's byte order.
    pub fn read_primitive(&mut self, p: Primitive) -> Result<Value, ParseError> {
        Ok(p.read(&mut *self.stream, self.byte_order)?)
    }

    /// Reads a record at the cursor. The nested record's origin is the current position.
    pub fn read_record(&mut self, schema: &Schema, args: &[Value]) -> Result<Record, ParseError> {
        schema.read(&mut *self.stream, args)
    }

    /// Resolves `directive` at the cursor, as if it were a field of this record.
    pub fn read(&mut self, directive: &Directive) -> Result<Value, ParseError> {
        resolve(directive, self)
    }

    /// See [offset::read_at].
    pub fn read_at<'s>(
        &mut self,
        target: impl Into<ReadTarget<'s>>,
        offset: i64,
        start: Option<u64>,
        args: &[Value],
    ) -> Result<Value, ParseError> {
        offset::read_at(&mut *self.stream, target, offset, start, args)
    }

    /// Reads a primitive at `offset` bytes from the record's origin, leaving the cursor alone.
    pub fn read_primitive_at(&mut self, p: Primitive, offset: i64) -> Result<Value, ParseError> {
        let target = ReadTarget::Primitive(p, self.byte_order);
        let origin = self.origin;
        self.read_at(target, offset, Some(origin), &[])
    }

    /// Reads a record at `offset` bytes from the record's origin, leaving the cursor alone.
    pub fn read_record_at(
        &mut self,
        schema: &Schema,
        offset: i64,
        args: &[Value],
    ) -> Result<Record, ParseError> {
        let origin = self.origin;
        match self.read_at(schema, offset, Some(origin), args)? {
            Value::Record(record) => Ok(record),
            other => Err(ReadError::TypeMismatch {
                name: schema.name().to_string(),
                expected: "record",
                found: other.kind_name(),
            }
            .into()),
        }
    }
}

/// Produces the value for one directive.
pub(crate) fn resolve(
    directive: &Directive,
    ctx: &mut ReadContext<'_>,
) -> Result<Value, ParseError> {
    match directive {
        Directive::Plain(ty) => read_type(ty, ctx),
        Directive::Collection { element, len } => {
            let count = len.evaluate_length(ctx.env)?;
            trace!(count, position = ctx.position(), "collection");

            let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                items.push(resolve(element, ctx)?);
            }

            Ok(Value::Array(items))
        }
        Directive::Custom(read) => match read.cursor() {
            CursorPolicy::Advance => read.call(ctx),
            CursorPolicy::Restore => {
                let saved = ctx.position();
                let result = read.call(ctx);
                offset::settle(result, ctx.stream.seek_to(saved))
            }
        },
    }
}

fn read_type(ty: &FieldType, ctx: &mut ReadContext<'_>) -> Result<Value, ParseError> {
    match ty {
        FieldType::Primitive(p) => ctx.read_primitive(*p),
        FieldType::Record { schema, args } => {
            let args = args
                .iter()
                .map(|arg| arg.evaluate(ctx.env))
                .collect::<Result<Vec<_>, _>>()?;

            ctx.read_record(schema, &args).map(Value::Record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expr::Expr, field::CustomRead, stream::MemoryStream};

    fn resolve_in(directive: &Directive, data: &[u8], env: &Env) -> Result<Value, ParseError> {
        let mut stream = MemoryStream::new(data);
        let mut ctx = ReadContext::new(&mut stream, env, 0, ByteOrder::Big);
        resolve(directive, &mut ctx)
    }

    #[test]
    fn test_plain() {
        let value =
            resolve_in(&Directive::from(Primitive::U16), &[0x01, 0x02], &Env::new()).unwrap();
        assert_eq!(value, Value::U16(0x0102));
    }

    #[test]
    fn test_collection_reads_count_elements() {
        let mut env = Env::new();
        env.bind("count", Value::U16(2));

        let directive = Directive::collection(Primitive::U16, "count");
        let value = resolve_in(&directive, &[0x00, 0x01, 0x00, 0x02, 0x00, 0x03], &env).unwrap();
        assert_eq!(value, Value::Array(vec![Value::U16(1), Value::U16(2)]));
    }

    #[test]
    fn test_collection_of_collections() {
        let mut env = Env::new();
        env.bind("rows", Value::U8(2));
        env.bind("cols", Value::U8(3));

        let directive = Directive::collection(Directive::collection(Primitive::U8, "cols"), "rows");
        let value = resolve_in(&directive, &[1, 2, 3, 4, 5, 6], &env).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Array(vec![Value::U8(1), Value::U8(2), Value::U8(3)]),
                Value::Array(vec![Value::U8(4), Value::U8(5), Value::U8(6)]),
            ])
        );
    }

    #[test]
    fn test_zero_length_collection() {
        let directive = Directive::collection(Primitive::U32, Expr::Const(0));
        let value = resolve_in(&directive, &[], &Env::new()).unwrap();
        assert_eq!(value, Value::Array(vec![]));
    }

    #[test]
    fn test_custom_restore_policy() {
        let read = CustomRead::new(&[], |ctx| ctx.read_primitive(Primitive::U8))
            .with_cursor(CursorPolicy::Restore);

        let mut stream = MemoryStream::new(&[7, 8]);
        let env = Env::new();
        let mut ctx = ReadContext::new(&mut stream, &env, 0, ByteOrder::Big);

        assert_eq!(resolve(&Directive::from(read), &mut ctx).unwrap(), Value::U8(7));
        assert_eq!(ctx.position(), 0);
    }

    #[test]
    fn test_custom_advance_policy() {
        let read = CustomRead::new(&[], |ctx| ctx.read_primitive(Primitive::U8));

        let mut stream = MemoryStream::new(&[7, 8]);
        let env = Env::new();
        let mut ctx = ReadContext::new(&mut stream, &env, 0, ByteOrder::Big);

        assert_eq!(resolve(&Directive::from(read), &mut ctx).unwrap(), Value::U8(7));
        assert_eq!(ctx.position(), 1);
    }

    #[test]
    fn test_custom_restore_on_failure() {
        let read = CustomRead::new(&[], |ctx| {
            ctx.read_primitive(Primitive::U8)?;
            Err(ReadError::Custom("bad magic".to_string()).into())
        })
        .with_cursor(CursorPolicy::Restore);

        let mut stream = MemoryStream::new(&[7, 8]);
        let env = Env::new();
        let mut ctx = ReadContext::new(&mut stream, &env, 0, ByteOrder::Big);

        let err = resolve(&Directive::from(read), &mut ctx).unwrap_err();
        assert!(matches!(err.kind(), ReadError::Custom(msg) if msg == "bad magic"));
        assert_eq!(ctx.position(), 0);
    }

    #[test]
    fn test_primitive_at_origin() {
        let mut stream = MemoryStream::new(&[0, 0, 0, 0x2A]);
        stream.seek_to(1).unwrap();
        let env = Env::new();
        let mut ctx = ReadContext::new(&mut stream, &env, 2, ByteOrder::Big);

        assert_eq!(ctx.read_primitive_at(Primitive::U8, 1).unwrap(), Value::U8(0x2A));
        assert_eq!(ctx.position(), 1);
    }
}

//! Schema: compiled, immutable read plan for one record type.

use std::io::{Read, Seek};

use tracing::{debug, trace};

use crate::{
    endian::ByteOrder,
    env::Env,
    errors::{CompileError, Frame, ParseError, ReadError},
    field::{Arg, Directive, Field, FieldType},
    primitive::Primitive,
    resolve::{ReadContext, resolve},
    stream::{ForwardStream, MemoryStream, SeekStream, Stream},
    value::{Record, Value},
};

const ARGUMENTS: &str = "(arguments)";

/// Everything needed to compile a [Schema]: its name, extra arguments, fields and policies.
#[derive(Debug, Clone)]
pub struct SchemaDecl {
    pub name: String,
    /// Extra arguments, bound before any field is read and visible to every field.
    pub args: Vec<Arg>,
    /// Fields in read order.
    pub fields: Vec<Field>,
    /// Byte order of primitives read for this type.
    pub byte_order: ByteOrder,
    /// Whether top-level parses of this type buffer the whole input in memory first.
    pub materialize: bool,
}

impl SchemaDecl {
    pub fn new(name: &str) -> Self {
        SchemaDecl {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn materialize(mut self, materialize: bool) -> Self {
        self.materialize = materialize;
        self
    }
}

impl Default for SchemaDecl {
    fn default() -> Self {
        SchemaDecl {
            name: String::new(),
            args: Vec::new(),
            fields: Vec::new(),
            byte_order: ByteOrder::default(),
            materialize: true,
        }
    }
}

/// A compiled schema. Use [Schema::compile] to build one from a [SchemaDecl], then one of the
/// `parse*` methods to read records.
///
/// Schemas are immutable and can be shared across threads; each parse owns its own
/// environment and stream.
#[derive(Debug)]
pub struct Schema {
    name: String,
    args: Vec<Arg>,
    fields: Vec<Field>,
    byte_order: ByteOrder,
    materialize: bool,
    min_len: u64,
}

impl Schema {
    /// Compiles a declaration. Fails if any name is invalid or any directive depends on a
    /// name that is not bound before it.
    pub fn compile(decl: SchemaDecl) -> Result<Self, CompileError> {
        if decl.name.is_empty() {
            return Err(CompileError::EmptySchemaName);
        }

        let mut bound: Vec<&str> = Vec::with_capacity(decl.args.len() + decl.fields.len());

        for arg in &decl.args {
            check_name(&arg.name, &bound)?;
            bound.push(&arg.name);
        }

        for field in &decl.fields {
            check_name(&field.name, &bound)?;

            for dep in field.directive.dependencies() {
                if !bound.contains(&dep) {
                    return Err(CompileError::DependencyViolation {
                        field: field.name.clone(),
                        name: dep.to_string(),
                    });
                }
            }

            check_directive(&field.name, &field.directive)?;
            bound.push(&field.name);
        }

        let min_len: u64 = decl
            .fields
            .iter()
            .map_while(|field| match &field.directive {
                Directive::Plain(FieldType::Primitive(p)) => Some(p.size() as u64),
                _ => None,
            })
            .fold(0, u64::saturating_add);

        debug!(
            schema = %decl.name,
            fields = decl.fields.len(),
            args = decl.args.len(),
            "compiled schema"
        );

        Ok(Schema {
            name: decl.name,
            args: decl.args,
            fields: decl.fields,
            byte_order: decl.byte_order,
            materialize: decl.materialize,
            min_len,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Whether primitives read for this type are byte-swapped.
    pub fn needs_swap(&self) -> bool {
        self.byte_order.needs_swap()
    }

    /// Whether a top-level parse of this type buffers the input in memory first.
    pub fn should_materialize(&self) -> bool {
        self.materialize
    }

    /// Bytes consumed by the leading run of primitive fields; a lower bound on record size.
    pub(crate) fn min_len(&self) -> u64 {
        self.min_len
    }

    /// Parses a record from bytes already in memory.
    pub fn parse(&self, data: &[u8], args: &[Value]) -> Result<Record, ParseError> {
        debug!(schema = %self.name, len = data.len(), "parsing in-memory input");
        self.read(&mut MemoryStream::new(data), args)
    }

    /// Parses a record from a forward-only reader.
    ///
    /// If the schema materializes, the reader is drained into memory first and offset reads
    /// work as usual. Otherwise reads go straight to the reader and any offset read fails
    /// with [ReadError::SeekUnsupported].
    pub fn parse_reader<R: Read>(
        &self,
        mut reader: R,
        args: &[Value],
    ) -> Result<Record, ParseError> {
        if self.materialize {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            debug!(schema = %self.name, len = data.len(), "materialized input");
            return self.read(&mut MemoryStream::from_vec(data), args);
        }

        debug!(schema = %self.name, "reading forward-only input in place");
        self.read(&mut ForwardStream::new(reader), args)
    }

    /// Parses a record from a seekable reader, starting at its current position.
    ///
    /// If the schema materializes, the rest of the reader is buffered in memory first;
    /// otherwise every read, including offset reads, goes to the reader.
    pub fn parse_seekable<R: Read + Seek>(
        &self,
        reader: R,
        args: &[Value],
    ) -> Result<Record, ParseError> {
        if self.materialize {
            return self.parse_reader(reader, args);
        }

        debug!(schema = %self.name, "reading seekable input in place");
        self.read(&mut SeekStream::new(reader)?, args)
    }

    /// Reads one record at the stream's cursor. The cursor position becomes the record's origin.
    ///
    /// No materialization decision is made here; this is the entry point for nested reads.
    pub fn read(&self, stream: &mut dyn Stream, args: &[Value]) -> Result<Record, ParseError> {
        let origin = stream.position();
        debug!(schema = %self.name, origin, "reading record");
        let mut env = self.bind_args(args, origin)?;

        for field in &self.fields {
            let offset = stream.position();
            trace!(schema = %self.name, field = %field.name, offset, "reading field");

            let value = {
                let mut ctx = ReadContext::new(&mut *stream, &env, origin, self.byte_order);
                resolve(&field.directive, &mut ctx)
            }
            .map_err(|err| err.within(self.frame(&field.name, offset)))?;

            env.bind(field.name.as_str(), value);
        }

        debug!(schema = %self.name, origin, end = stream.position(), "read record");
        Ok(Record::from(env.into_tail(self.args.len())))
    }

    fn bind_args(&self, args: &[Value], origin: u64) -> Result<Env, ParseError> {
        if args.len() != self.args.len() {
            let err = ReadError::ArgumentCount {
                expected: self.args.len(),
                given: args.len(),
            };
            return Err(ParseError::from(err).within(self.frame(ARGUMENTS, origin)));
        }

        let mut env = Env::new();
        for (decl, value) in self.args.iter().zip(args) {
            if !decl.ty.accepts(value) {
                let err = ReadError::TypeMismatch {
                    name: decl.name.clone(),
                    expected: decl.ty.name(),
                    found: value.kind_name(),
                };
                return Err(ParseError::from(err).within(self.frame(ARGUMENTS, origin)));
            }

            env.bind(decl.name.as_str(), value.clone());
        }

        Ok(env)
    }

    fn frame(&self, field: &str, offset: u64) -> Frame {
        Frame {
            schema: self.name.clone(),
            field: field.to_string(),
            offset,
        }
    }
}

fn check_name(name: &str, bound: &[&str]) -> Result<(), CompileError> {
    if name.is_empty() {
        return Err(CompileError::InvalidFieldName(name.to_string()));
    }

    if bound.contains(&name) {
        return Err(CompileError::DuplicateName(name.to_string()));
    }

    Ok(())
}

fn check_directive(field: &str, directive: &Directive) -> Result<(), CompileError> {
    match directive {
        Directive::Plain(FieldType::Primitive(Primitive::Tag(0))) => {
            Err(CompileError::InvalidTagLength(field.to_string()))
        }
        Directive::Plain(FieldType::Primitive(_)) | Directive::Custom(_) => Ok(()),
        Directive::Plain(FieldType::Record { schema, args }) => {
            if args.len() != schema.args.len() {
                return Err(CompileError::ArgumentCount {
                    field: field.to_string(),
                    schema: schema.name.clone(),
                    expected: schema.args.len(),
                    given: args.len(),
                });
            }

            Ok(())
        }
        Directive::Collection { element, .. } => check_directive(field, element),
    }
}

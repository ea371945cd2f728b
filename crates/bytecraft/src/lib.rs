//! # bytecraft
//!
//! A library for reading binary records described by declarative schemas.
//!
//! A schema is an ordered list of fields. Each field is read with a directive: a plain
//! typed read, a collection whose length is computed from earlier fields, or a custom
//! procedure that can follow offsets into nested records without disturbing the stream
//! cursor. This covers formats built from offset tables and variable-length arrays, such as
//! OpenType layout tables.
//!
//! ## Example
//!
//! ```
//! use bytecraft::endian::ByteOrder;
//! use bytecraft::field::Field;
//! use bytecraft::primitive::Primitive;
//! use bytecraft::schema::{Schema, SchemaDecl};
//! use bytecraft::value::Value;
//!
//! let schema = Schema::compile(
//!     SchemaDecl::new("MarkArray")
//!         .byte_order(ByteOrder::Big)
//!         .field(Field::plain("count", Primitive::U16))
//!         .field(Field::collection("items", Primitive::U16, "count")),
//! )
//! .unwrap();
//!
//! let record = schema.parse(&[0x00, 0x02, 0x00, 0x01, 0x00, 0x02], &[]).unwrap();
//! assert_eq!(
//!     record.get("items"),
//!     Some(&Value::Array(vec![Value::U16(1), Value::U16(2)]))
//! );
//! ```

use std::io::{Read, Seek};

pub mod endian;
pub mod env;
pub mod errors;
pub mod expr;
pub mod field;
pub mod offset;
pub mod primitive;
pub mod registry;
pub mod resolve;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod stream;
pub mod value;

pub use errors::{CompileError, ParseError, ReadError};
pub use offset::read_at;
pub use schema::{Schema, SchemaDecl};
pub use value::{Record, Value};

/// Parses one record of `schema` from `reader`, starting at its current position.
///
/// The schema's materialization policy decides whether the input is buffered first.
pub fn parse<R: Read + Seek>(
    reader: R,
    schema: &Schema,
    args: &[Value],
) -> Result<Record, ParseError> {
    schema.parse_seekable(reader, args)
}

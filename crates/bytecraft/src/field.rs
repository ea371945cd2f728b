//! Definition of fields, directives and extra arguments used to build a [crate::schema::Schema].

use std::{fmt, sync::Arc};

use crate::{
    errors::ParseError, expr::Expr, primitive::Primitive, resolve::ReadContext, schema::Schema,
    value::Value,
};

/// A single named field in a schema.
#[derive(Debug, Clone)]
pub struct Field {
    /// Name used for the binding and in the parsed record.
    pub name: String,
    /// How the field's value is obtained.
    pub directive: Directive,
}

impl Field {
    pub fn new(name: &str, directive: Directive) -> Self {
        Field {
            name: name.to_string(),
            directive,
        }
    }

    /// A field read with the typed-read primitive for `ty`.
    pub fn plain(name: &str, ty: impl Into<FieldType>) -> Self {
        Self::new(name, Directive::Plain(ty.into()))
    }

    /// A field holding `len` elements, each read with `element`.
    pub fn collection(name: &str, element: impl Into<Directive>, len: impl Into<Expr>) -> Self {
        Self::new(name, Directive::collection(element, len))
    }

    pub fn custom(name: &str, read: CustomRead) -> Self {
        Self::new(name, Directive::Custom(read))
    }
}

/// Rule governing how one value is obtained.
#[derive(Debug, Clone)]
pub enum Directive {
    Plain(FieldType),
    /// Sequence whose length is computed from earlier bindings.
    Collection {
        element: Box<Directive>,
        len: Expr,
    },
    Custom(CustomRead),
}

impl Directive {
    pub fn collection(element: impl Into<Directive>, len: impl Into<Expr>) -> Self {
        Directive::Collection {
            element: Box::new(element.into()),
            len: len.into(),
        }
    }

    /// Names this directive reads from the environment.
    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            Directive::Plain(FieldType::Primitive(_)) => Vec::new(),
            Directive::Plain(FieldType::Record { args, .. }) => {
                args.iter().flat_map(Expr::dependencies).collect()
            }
            Directive::Collection { element, len } => {
                let mut out = len.dependencies();
                out.extend(element.dependencies());
                out
            }
            Directive::Custom(read) => read.deps.iter().map(String::as_str).collect(),
        }
    }
}

impl From<FieldType> for Directive {
    fn from(ty: FieldType) -> Self {
        Directive::Plain(ty)
    }
}

impl From<Primitive> for Directive {
    fn from(p: Primitive) -> Self {
        Directive::Plain(p.into())
    }
}

impl From<CustomRead> for Directive {
    fn from(read: CustomRead) -> Self {
        Directive::Custom(read)
    }
}

/// Declared type of a plain field or collection element.
#[derive(Debug, Clone)]
pub enum FieldType {
    Primitive(Primitive),
    /// A nested record, read with its own schema and origin.
    Record {
        schema: Arc<Schema>,
        /// Extra arguments for the nested schema, evaluated in the enclosing environment.
        args: Vec<Expr>,
    },
}

impl FieldType {
    pub fn record(schema: &Arc<Schema>) -> Self {
        FieldType::Record {
            schema: Arc::clone(schema),
            args: Vec::new(),
        }
    }

    pub fn record_with_args(schema: &Arc<Schema>, args: Vec<Expr>) -> Self {
        FieldType::Record {
            schema: Arc::clone(schema),
            args,
        }
    }
}

impl From<Primitive> for FieldType {
    fn from(p: Primitive) -> Self {
        FieldType::Primitive(p)
    }
}

impl From<&Arc<Schema>> for FieldType {
    fn from(schema: &Arc<Schema>) -> Self {
        FieldType::record(schema)
    }
}

/// What a custom read procedure may leave behind in the stream cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPolicy {
    /// Cursor movement made by the procedure persists; the next field starts where it stopped.
    #[default]
    Advance,
    /// The cursor is put back where it was before the procedure ran, whether it succeeded or not.
    Restore,
}

/// Signature of a custom read procedure.
pub type ReadFn = dyn Fn(&mut ReadContext<'_>) -> Result<Value, ParseError> + Send + Sync;

/// A custom read procedure plus the names it reads and its cursor policy.
#[derive(Clone)]
pub struct CustomRead {
    deps: Vec<String>,
    cursor: CursorPolicy,
    func: Arc<ReadFn>,
}

impl CustomRead {
    /// `deps` lists every field or argument the procedure reads through the environment.
    pub fn new<F>(deps: &[&str], func: F) -> Self
    where
        F: Fn(&mut ReadContext<'_>) -> Result<Value, ParseError> + Send + Sync + 'static,
    {
        CustomRead {
            deps: deps.iter().map(|d| d.to_string()).collect(),
            cursor: CursorPolicy::Advance,
            func: Arc::new(func),
        }
    }

    pub fn with_cursor(mut self, cursor: CursorPolicy) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> CursorPolicy {
        self.cursor
    }

    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    pub(crate) fn call(&self, ctx: &mut ReadContext<'_>) -> Result<Value, ParseError> {
        (self.func)(ctx)
    }
}

impl fmt::Debug for CustomRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRead")
            .field("deps", &self.deps)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

/// Kind of value an extra argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ArgType {
    #[default]
    Any,
    Integer,
    Float,
    Tag,
    Array,
    Record,
}

impl ArgType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ArgType::Any => true,
            ArgType::Integer => value.as_integer().is_some(),
            ArgType::Float => value.as_float().is_some(),
            ArgType::Tag => value.as_tag().is_some(),
            ArgType::Array => value.as_array().is_some(),
            ArgType::Record => value.as_record().is_some(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ArgType::Any => "any",
            ArgType::Integer => "integer",
            ArgType::Float => "float",
            ArgType::Tag => "tag",
            ArgType::Array => "array",
            ArgType::Record => "record",
        }
    }
}

/// An extra argument a schema requires at invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: String,
    pub ty: ArgType,
}

impl Arg {
    pub fn new(name: &str, ty: ArgType) -> Self {
        Arg {
            name: name.to_string(),
            ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_dependencies() {
        let directive = Directive::collection(
            Directive::collection(Primitive::U16, "mark_class_count"),
            "component_count",
        );
        assert_eq!(
            directive.dependencies(),
            vec!["component_count", "mark_class_count"]
        );
    }

    #[test]
    fn test_custom_dependencies() {
        let read = CustomRead::new(&["offsets"], |_| Ok(Value::U8(0)));
        assert_eq!(Directive::from(read).dependencies(), vec!["offsets"]);
    }

    #[test]
    fn test_custom_read_debug_and_policy() {
        let read = CustomRead::new(&[], |_| Ok(Value::U8(0))).with_cursor(CursorPolicy::Restore);
        assert_eq!(read.cursor(), CursorPolicy::Restore);
        assert!(format!("{read:?}").starts_with("CustomRead"));
    }

    #[test]
    fn test_arg_type_accepts() {
        assert!(ArgType::Integer.accepts(&Value::U16(1)));
        assert!(!ArgType::Integer.accepts(&Value::F32(1.0)));
        assert!(ArgType::Any.accepts(&Value::Tag(vec![])));
        assert!(ArgType::Array.accepts(&Value::Array(vec![])));
    }
}

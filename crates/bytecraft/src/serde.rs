//! JSON-deserializable schema description.
//!
//! These types describe schemas as data, for example a schema file shipped with your
//! application. Nested records refer to other schemas by name and are resolved against a
//! [SchemaRegistry] when the description is registered.
//!
//! Custom directives are Rust closures and have no data form; declare those with
//! [crate::field::CustomRead].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    endian::ByteOrder,
    errors::CompileError,
    expr::Expr,
    field::{Arg, ArgType, Directive, Field, FieldType},
    primitive::Primitive,
    registry::SchemaRegistry,
    schema::{Schema, SchemaDecl},
};

/// Top-level schema definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    /// Registry key and name used in error context.
    pub name: String,
    /// Extra arguments required when reading this schema.
    #[serde(default)]
    pub args: Vec<ArgDef>,
    /// Fields in read order.
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub byte_order: ByteOrder,
    /// Defaults to `true`.
    #[serde(default = "default_materialize")]
    pub materialize: bool,
}

fn default_materialize() -> bool {
    true
}

/// Extra argument declaration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArgDef {
    pub name: String,
    #[serde(default)]
    pub ty: ArgType,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    pub name: String,
    pub directive: DirectiveDef,
}

/// Data form of [Directive], without custom procedures.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum DirectiveDef {
    Plain(TypeDef),
    Collection {
        element: Box<DirectiveDef>,
        len: Expr,
    },
}

/// Data form of [FieldType]. Records are referenced by registered name.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum TypeDef {
    Primitive(Primitive),
    Record {
        schema: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl From<ArgDef> for Arg {
    fn from(value: ArgDef) -> Self {
        Arg {
            name: value.name,
            ty: value.ty,
        }
    }
}

impl DirectiveDef {
    fn into_directive(self, registry: &SchemaRegistry) -> Result<Directive, CompileError> {
        match self {
            DirectiveDef::Plain(ty) => Ok(Directive::Plain(ty.into_field_type(registry)?)),
            DirectiveDef::Collection { element, len } => Ok(Directive::Collection {
                element: Box::new(element.into_directive(registry)?),
                len,
            }),
        }
    }
}

impl TypeDef {
    fn into_field_type(self, registry: &SchemaRegistry) -> Result<FieldType, CompileError> {
        match self {
            TypeDef::Primitive(p) => Ok(FieldType::Primitive(p)),
            TypeDef::Record { schema, args } => Ok(FieldType::Record {
                schema: registry.resolve(&schema)?,
                args,
            }),
        }
    }
}

impl SchemaDef {
    /// Converts into a [SchemaDecl], resolving nested schema names against `registry`.
    pub fn into_decl(self, registry: &SchemaRegistry) -> Result<SchemaDecl, CompileError> {
        let fields = self
            .fields
            .into_iter()
            .map(|field| -> Result<Field, CompileError> {
                Ok(Field {
                    name: field.name,
                    directive: field.directive.into_directive(registry)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SchemaDecl {
            name: self.name,
            args: self.args.into_iter().map(Into::into).collect(),
            fields,
            byte_order: self.byte_order,
            materialize: self.materialize,
        })
    }
}

impl SchemaRegistry {
    /// Resolves, compiles and registers a schema description.
    ///
    /// Schemas must be registered after every schema they reference.
    pub fn register_def(&mut self, def: SchemaDef) -> Result<Arc<Schema>, CompileError> {
        let decl = def.into_decl(self)?;
        self.register(decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const LEAF: &str = r#"{
        "name": "Leaf",
        "fields": [
            { "name": "value", "directive": { "Plain": { "Primitive": "U8" } } }
        ]
    }"#;

    const TABLE: &str = r#"{
        "name": "Table",
        "byte_order": "Big",
        "fields": [
            { "name": "count", "directive": { "Plain": { "Primitive": "U16" } } },
            {
                "name": "leaves",
                "directive": {
                    "Collection": {
                        "element": { "Plain": { "Record": { "schema": "Leaf" } } },
                        "len": { "Ref": "count" }
                    }
                }
            },
            { "name": "tag", "directive": { "Plain": { "Primitive": { "Tag": 4 } } } }
        ]
    }"#;

    #[test]
    fn test_register_json_schemas() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_def(serde_json::from_str(LEAF).unwrap())
            .unwrap();
        let table = registry
            .register_def(serde_json::from_str(TABLE).unwrap())
            .unwrap();

        assert!(table.should_materialize());
        assert_eq!(table.byte_order(), ByteOrder::Big);

        let record = table
            .parse(&[0x00, 0x02, 0x0A, 0x0B, b'c', b'm', b'a', b'p'], &[])
            .unwrap();

        let leaves = record.get("leaves").and_then(Value::as_array).unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(
            leaves[1].as_record().and_then(|r| r.get("value")),
            Some(&Value::U8(0x0B))
        );
        assert_eq!(record.get("tag"), Some(&Value::Tag(b"cmap".to_vec())));
    }

    #[test]
    fn test_unknown_nested_schema() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .register_def(serde_json::from_str(TABLE).unwrap())
            .unwrap_err();

        assert_eq!(err, CompileError::UnknownSchema("Leaf".to_string()));
    }

    #[test]
    fn test_forward_reference_in_json() {
        let json = r#"{
            "name": "Bad",
            "fields": [
                {
                    "name": "items",
                    "directive": {
                        "Collection": {
                            "element": { "Plain": { "Primitive": "U8" } },
                            "len": { "Ref": "count" }
                        }
                    }
                },
                { "name": "count", "directive": { "Plain": { "Primitive": "U8" } } }
            ]
        }"#;

        let mut registry = SchemaRegistry::new();
        let err = registry
            .register_def(serde_json::from_str(json).unwrap())
            .unwrap_err();

        assert!(matches!(err, CompileError::DependencyViolation { .. }));
    }
}

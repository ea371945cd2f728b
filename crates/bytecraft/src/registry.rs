//! Registry of compiled schemas, keyed by name.

use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::{
    errors::CompileError,
    schema::{Schema, SchemaDecl},
};

/// Named, shared schemas. A schema is compiled once when registered and never changes.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and registers a schema. Fails if the name is taken or compilation fails.
    pub fn register(&mut self, decl: SchemaDecl) -> Result<Arc<Schema>, CompileError> {
        if self.schemas.contains_key(&decl.name) {
            return Err(CompileError::DuplicateName(decl.name));
        }

        let schema = Arc::new(Schema::compile(decl)?);
        debug!(schema = %schema.name(), "registered schema");
        self.schemas
            .insert(schema.name().to_string(), Arc::clone(&schema));

        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    /// Like [SchemaRegistry::get], but a missing schema is an error.
    pub fn resolve(&self, name: &str) -> Result<Arc<Schema>, CompileError> {
        self.get(name)
            .ok_or_else(|| CompileError::UnknownSchema(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

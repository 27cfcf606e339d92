//! Validation context and output types.
//!
//! `ValidationContext` bundles the schema, the data tree and the
//! options with the mutable state (current path, accumulated errors).
//! Interior mutability lets validators record errors through shared
//! references; fork/merge supports trial validation of union
//! alternatives.

use std::cell::RefCell;

use ytree_value::{DataPath, DataPathSegment, DataTree, KeyValue};

use crate::options::ValidationOptions;
use crate::schema::SchemaTree;

use super::error::ValidationError;

/// Final validation output returned to callers.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutput {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Internal mutable state during validation.
#[derive(Debug)]
pub struct ValidationState {
    /// Current position in the data tree, for error reporting.
    pub path: DataPath,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationState {
    fn default() -> Self {
        Self {
            path: DataPath::root(),
            errors: Vec::new(),
        }
    }
}

impl ValidationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Clone position, not errors, for trial validation.
    pub fn fork(&self) -> Self {
        Self {
            path: self.path.clone(),
            errors: Vec::new(),
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    pub fn finish(self) -> ValidationOutput {
        ValidationOutput {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
        }
    }
}

/// Shared context threaded through all validators.
pub struct ValidationContext<'a> {
    pub schema: &'a SchemaTree,
    pub data: &'a DataTree,
    pub options: &'a ValidationOptions,
    pub state: RefCell<ValidationState>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        schema: &'a SchemaTree,
        data: &'a DataTree,
        options: &'a ValidationOptions,
    ) -> Self {
        Self {
            schema,
            data,
            options,
            state: RefCell::new(ValidationState::new()),
        }
    }

    pub fn record_error(&self, error: ValidationError) {
        self.state.borrow_mut().record_error(error);
    }

    pub fn path(&self) -> DataPath {
        self.state.borrow().path.clone()
    }

    pub fn push_field(&self, name: &str) {
        self.state
            .borrow_mut()
            .path
            .0
            .push(DataPathSegment::Field(name.to_string()));
    }

    pub fn push_key(&self, key: KeyValue) {
        self.state
            .borrow_mut()
            .path
            .0
            .push(DataPathSegment::Key(key));
    }

    pub fn push_index(&self, index: usize) {
        self.state
            .borrow_mut()
            .path
            .0
            .push(DataPathSegment::Index(index));
    }

    pub fn pop_path(&self) {
        self.state.borrow_mut().path.0.pop();
    }

    pub fn fork_state(&self) -> ValidationState {
        self.state.borrow().fork()
    }

    pub fn merge_state(&self, other: ValidationState) {
        self.state.borrow_mut().merge(other);
    }

    pub fn finish(self) -> ValidationOutput {
        self.state.into_inner().finish()
    }
}

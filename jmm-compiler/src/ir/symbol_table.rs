use crate::ir::ast::{Program, Type, VarDecl};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Symbol = VarDecl;

/// Class-level symbol table handed over by the front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    class_name: String,
    super_class: Option<String>,
    imports: Vec<String>,
    methods: Vec<String>,
    return_types: HashMap<String, Type>,
    params: HashMap<String, Vec<Symbol>>,
    locals: HashMap<String, Vec<Symbol>>,
    fields: Vec<Symbol>,
}

impl SymbolTable {
    /// Collect the declarations of a typed program.
    pub fn from_program(program: &Program) -> Self {
        let class = &program.class;
        let mut table = Self {
            class_name: class.name.clone(),
            super_class: class.super_class.clone(),
            imports: program.imports.clone(),
            fields: class.fields.clone(),
            ..Self::default()
        };

        for method in &class.methods {
            table.methods.push(method.name.clone());
            table
                .return_types
                .insert(method.name.clone(), method.return_type.clone());
            table
                .params
                .insert(method.name.clone(), method.params.clone());
            table
                .locals
                .insert(method.name.clone(), method.locals.clone());
        }
        table
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn fields(&self) -> &[Symbol] {
        &self.fields
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m == name)
    }

    pub fn return_type(&self, method: &str) -> Option<&Type> {
        self.return_types.get(method)
    }

    pub fn parameters(&self, method: &str) -> &[Symbol] {
        self.params.get(method).map_or(&[], Vec::as_slice)
    }

    pub fn local_variables(&self, method: &str) -> &[Symbol] {
        self.locals.get(method).map_or(&[], Vec::as_slice)
    }

    /// Whether `name` refers to a class field inside `method`
    /// (locals and parameters shadow fields).
    pub fn is_field(&self, method: &str, name: &str) -> bool {
        if self.local_variables(method).iter().any(|s| s.name == name) {
            return false;
        }
        if self.parameters(method).iter().any(|s| s.name == name) {
            return false;
        }
        self.fields.iter().any(|s| s.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|s| s.name == name)
    }

    /// Whether a simple class name matches the last segment of an import.
    pub fn is_imported(&self, simple_name: &str) -> bool {
        self.imports
            .iter()
            .any(|path| path.rsplit('.').next() == Some(simple_name))
    }
}

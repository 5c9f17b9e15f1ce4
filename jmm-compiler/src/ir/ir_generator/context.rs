use crate::ir::ast;
use crate::ir::symbol_table::SymbolTable;
use crate::ir::*;

/// Per-compilation lowering state.
///
/// The temporary counter lives here so that two compilations never share
/// numbering; it is monotonic across the methods of one class.
pub struct Gen<'a> {
    pub table: &'a SymbolTable,
    pub out: ClassUnit,
    pub temp_count: usize,
    pub method: Option<Method>,
    /// Declared type of the assignment currently being lowered, if any.
    pub assign_ty: Option<ast::Type>,
}

impl<'a> Gen<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        let mut out = ClassUnit::new(table.class_name());
        out.super_class = table.super_class().map(str::to_string);
        out.imports = table.imports().to_vec();
        out.fields = table
            .fields()
            .iter()
            .map(|f| Field {
                name: f.name.clone(),
                ty: IrType::from_ast(&f.ty),
                visibility: Visibility::Public,
            })
            .collect();

        Self {
            table,
            out,
            temp_count: 0,
            method: None,
            assign_ty: None,
        }
    }

    pub fn finish(self) -> ClassUnit {
        self.out
    }

    pub fn class_name(&self) -> &str {
        self.table.class_name()
    }

    pub fn method_name(&self) -> &str {
        self.method.as_ref().map_or("", |m| m.name.as_str())
    }

    /// Fresh `tmp<N>` of the given type, skipping names the method already declares.
    pub fn new_temp(&mut self, ty: IrType) -> Operand {
        loop {
            let name = format!("{TEMP_PREFIX}{}", self.temp_count);
            self.temp_count += 1;
            if self.is_declared_name(&name) {
                continue;
            }
            self.declare(&name, ty.clone(), VarScope::Local);
            return Operand::var(name, ty);
        }
    }

    fn is_declared_name(&self, name: &str) -> bool {
        let method = self.method_name();
        self.table.local_variables(method).iter().any(|s| s.name == name)
            || self.table.parameters(method).iter().any(|s| s.name == name)
            || self.table.field(name).is_some()
            || self
                .method
                .as_ref()
                .is_some_and(|m| m.var_table.contains_key(name))
    }

    pub fn declare(&mut self, name: &str, ty: IrType, scope: VarScope) {
        if let Some(method) = self.method.as_mut() {
            method.declare(name, ty, scope);
        }
    }

    pub fn emit(&mut self, instr: Instr) {
        if let Some(method) = self.method.as_mut() {
            method.instrs.push(instr);
        }
    }

    pub fn is_field(&self, name: &str) -> bool {
        self.table.is_field(self.method_name(), name)
    }

    /// Temporarily set the enclosing assignment type while lowering `f`.
    pub fn with_assign_type<F, R>(&mut self, ty: Option<ast::Type>, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let prev = std::mem::replace(&mut self.assign_ty, ty);
        let result = f(self);
        self.assign_ty = prev;
        result
    }
}

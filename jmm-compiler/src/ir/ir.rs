// A linear, typed three-address IR for one class, one instruction list per method.

use super::ast;
use super::cfg::Cfg;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Int,
    Bool,
    Void,
    String,
    Array(Box<IrType>),
    Class(String),
}

impl IrType {
    pub fn from_ast(ty: &ast::Type) -> Self {
        let base = match ty.name.as_str() {
            "int" => IrType::Int,
            "boolean" => IrType::Bool,
            "void" => IrType::Void,
            "String" => IrType::String,
            other => IrType::Class(other.to_string()),
        };
        if ty.is_array {
            IrType::Array(Box::new(base))
        } else {
            base
        }
    }

    /// Values of this type live in reference slots (`aload`/`astore`).
    pub fn is_reference(&self) -> bool {
        matches!(self, IrType::String | IrType::Array(_) | IrType::Class(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Int => write!(f, "i32"),
            IrType::Bool => write!(f, "bool"),
            IrType::Void => write!(f, "V"),
            IrType::String => write!(f, "String"),
            IrType::Array(elem) => write!(f, "array.{elem}"),
            IrType::Class(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Variable { name: String, ty: IrType },
    Literal { value: i32, ty: IrType },
}

impl Operand {
    pub fn var(name: impl Into<String>, ty: IrType) -> Self {
        Operand::Variable {
            name: name.into(),
            ty,
        }
    }

    pub fn int(value: i32) -> Self {
        Operand::Literal {
            value,
            ty: IrType::Int,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Operand::Literal {
            value: value as i32,
            ty: IrType::Bool,
        }
    }

    pub fn this(class_name: &str) -> Self {
        Operand::var("this", IrType::Class(class_name.to_string()))
    }

    /// A bare class name used as the receiver of a static call.
    pub fn class_ref(name: impl Into<String>) -> Self {
        let name = name.into();
        Operand::Variable {
            ty: IrType::Class(name.clone()),
            name,
        }
    }

    pub fn ty(&self) -> &IrType {
        match self {
            Operand::Variable { ty, .. } | Operand::Literal { ty, .. } => ty,
        }
    }

    /// Variable name, `None` for literals.
    pub fn name(&self) -> Option<&str> {
        match self {
            Operand::Variable { name, .. } => Some(name),
            Operand::Literal { .. } => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Operand::Literal { .. })
    }

    fn is_class_ref(&self) -> bool {
        matches!(self, Operand::Variable { name, ty: IrType::Class(c) } if name == c)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Variable { name, .. } if name == "this" || self.is_class_ref() => {
                write!(f, "{name}")
            }
            Operand::Variable { name, ty } => write!(f, "{name}.{ty}"),
            Operand::Literal { value, ty } => write!(f, "{value}.{ty}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub name: String,
    pub ty: IrType,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Static,
    Virtual,
    Special,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallKind::Static => "invokestatic",
            CallKind::Virtual => "invokevirtual",
            CallKind::Special => "invokespecial",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_ast(op: ast::BinOp) -> Self {
        match op {
            ast::BinOp::Add => BinaryOp::Add,
            ast::BinOp::Sub => BinaryOp::Sub,
            ast::BinOp::Mul => BinaryOp::Mul,
            ast::BinOp::Div => BinaryOp::Div,
            ast::BinOp::Lt => BinaryOp::Lt,
            ast::BinOp::And => BinaryOp::And,
            ast::BinOp::Or => BinaryOp::Or,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `dest.t :=.t rhs`
    Assign {
        dest: Operand,
        ty: IrType,
        rhs: Box<Instr>,
    },
    /// A lone operand, only meaningful as the right-hand side of an assignment
    SingleOp { operand: Operand },
    /// `left op.t right`
    BinaryOp {
        op: BinaryOp,
        left: Operand,
        right: Operand,
        ty: IrType,
    },
    Return { ty: IrType, value: Option<Operand> },
    Call {
        kind: CallKind,
        target: Operand,
        method: String,
        args: Vec<Operand>,
        ret: IrType,
    },
    NewObject { class_name: String, ty: IrType },
    NewArray { size: Operand, ty: IrType },
    /// `array[index].t`
    ArrayLoad {
        array: Operand,
        index: Operand,
        ty: IrType,
    },
    /// `arraylength(array).t`
    ArrayLength { array: Operand, ty: IrType },
    GetField { object: Operand, field: FieldRef },
    PutField {
        object: Operand,
        field: FieldRef,
        value: Operand,
    },
}

impl Instr {
    pub fn assign(dest: Operand, rhs: Instr) -> Self {
        Instr::Assign {
            ty: dest.ty().clone(),
            dest,
            rhs: Box::new(rhs),
        }
    }

    pub fn copy(dest: Operand, src: Operand) -> Self {
        Self::assign(dest, Instr::SingleOp { operand: src })
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Assign { dest, ty, rhs } => write!(f, "{dest} :=.{ty} {rhs}"),
            Instr::SingleOp { operand } => write!(f, "{operand}"),
            Instr::BinaryOp {
                op,
                left,
                right,
                ty,
            } => write!(f, "{left} {op}.{ty} {right}"),
            Instr::Return { ty, value } => match value {
                Some(v) => write!(f, "ret.{ty} {v}"),
                None => write!(f, "ret.{ty}"),
            },
            Instr::Call {
                kind,
                target,
                method,
                args,
                ret,
            } => {
                write!(f, "{kind}({target}, \"{method}\"")?;
                for a in args {
                    write!(f, ", {a}")?;
                }
                write!(f, ").{ret}")
            }
            Instr::NewObject { class_name, ty } => write!(f, "new({class_name}).{ty}"),
            Instr::NewArray { size, ty } => write!(f, "new(array, {size}).{ty}"),
            Instr::ArrayLoad { array, index, ty } => write!(f, "{array}[{index}].{ty}"),
            Instr::ArrayLength { array, ty } => write!(f, "arraylength({array}).{ty}"),
            Instr::GetField { object, field } => {
                write!(f, "getfield({object}, {field}).{}", field.ty)
            }
            Instr::PutField {
                object,
                field,
                value,
            } => write!(f, "putfield({object}, {field}, {value}).V"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    Default,
}

impl Visibility {
    /// Modifier text including its trailing space; empty for package access.
    pub fn modifier(&self) -> &'static str {
        match self {
            Visibility::Public => "public ",
            Visibility::Private => "private ",
            Visibility::Protected => "protected ",
            Visibility::Default => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarScope {
    Param,
    Local,
    This,
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDescriptor {
    pub ty: IrType,
    pub scope: VarScope,
    pub slot: usize,
}

/// Variable name → descriptor, ordered by name.
pub type VarTable = BTreeMap<String, VarDescriptor>;

/// Prefix of compiler-synthesized temporaries.
pub const TEMP_PREFIX: &str = "tmp";

/// Whether `name` follows the temporary naming convention (`tmp<N>`).
pub fn is_temp_name(name: &str) -> bool {
    name.strip_prefix(TEMP_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub params: Vec<Operand>,
    pub return_type: IrType,
    pub instrs: Vec<Instr>,
    pub cfg: Cfg,
    pub var_table: VarTable,
}

impl Method {
    pub fn new(name: impl Into<String>, is_static: bool, return_type: IrType) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static,
            params: Vec::new(),
            return_type,
            instrs: Vec::new(),
            cfg: Cfg::default(),
            var_table: VarTable::new(),
        }
    }

    /// Rebuild the successor table from the current instruction list.
    pub fn build_cfg(&mut self) {
        self.cfg = Cfg::build(&self.instrs);
    }

    pub fn is_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name() == Some(name))
    }

    /// First slot available to locals: the receiver (if any) and parameters come first.
    pub fn base_slot(&self) -> usize {
        usize::from(!self.is_static) + self.params.len()
    }

    /// Next unused slot under the one-slot-per-variable numbering.
    pub fn next_free_slot(&self) -> usize {
        self.var_table
            .values()
            .map(|d| d.slot + 1)
            .max()
            .unwrap_or(0)
            .max(self.base_slot())
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: IrType, scope: VarScope) -> usize {
        let name = name.into();
        if let Some(existing) = self.var_table.get(&name) {
            return existing.slot;
        }
        let slot = self.next_free_slot();
        self.var_table.insert(name, VarDescriptor { ty, scope, slot });
        slot
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: IrType,
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct ClassUnit {
    pub name: String,
    pub super_class: Option<String>,
    pub imports: Vec<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl ClassUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_class: None,
            imports: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut Method> {
        self.methods.iter_mut().find(|m| m.name == name)
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for import in &self.imports {
            out.push(format!("import {import};"));
        }
        match &self.super_class {
            Some(sup) => out.push(format!("{} extends {sup} {{", self.name)),
            None => out.push(format!("{} {{", self.name)),
        }
        for field in &self.fields {
            out.push(format!(
                "  .field {}{}.{};",
                field.visibility.modifier(),
                field.name,
                field.ty
            ));
        }
        out.push(format!("  .construct {}().V {{", self.name));
        out.push("    invokespecial(this, \"<init>\").V;".to_string());
        out.push("  }".to_string());

        for method in &self.methods {
            let params = method
                .params
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            out.push(format!(
                "  .method {}{}{}({params}).{} {{",
                method.visibility.modifier(),
                if method.is_static { "static " } else { "" },
                method.name,
                method.return_type
            ));
            for instr in &method.instrs {
                out.push(format!("    {instr};"));
            }
            out.push("  }".to_string());
        }
        out.push("}".to_string());
        out
    }
}

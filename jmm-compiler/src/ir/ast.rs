//! Typed syntax tree consumed by the backend.
//!
//! The tree is produced by the front end after semantic analysis: every
//! expression already carries its resolved type. Names typed as
//! [`Type::IMPORTED`] refer to external classes from the import list.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Type {
    pub name: String,
    #[serde(default)]
    pub is_array: bool,
}

impl Type {
    /// Type name the front end assigns to anything resolved through an import.
    pub const IMPORTED: &'static str = "imported";

    pub fn new(name: impl Into<String>, is_array: bool) -> Self {
        Self {
            name: name.into(),
            is_array,
        }
    }

    pub fn int() -> Self {
        Self::new("int", false)
    }

    pub fn int_array() -> Self {
        Self::new("int", true)
    }

    pub fn boolean() -> Self {
        Self::new("boolean", false)
    }

    pub fn void() -> Self {
        Self::new("void", false)
    }

    pub fn string_array() -> Self {
        Self::new("String", true)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn imported() -> Self {
        Self::new(Self::IMPORTED, false)
    }

    pub fn is_imported(&self) -> bool {
        self.name == Self::IMPORTED
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && !self.is_array
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub imports: Vec<String>,
    pub class: ClassDecl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub super_class: Option<String>,
    #[serde(default)]
    pub fields: Vec<VarDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
    pub return_type: Type,
    #[serde(default)]
    pub params: Vec<VarDecl>,
    #[serde(default)]
    pub locals: Vec<VarDecl>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    /// `name = value;` where `ty` is the declared type of `name`
    Assign { name: String, ty: Type, value: Expr },
    /// Expression evaluated for its side effects (usually a call)
    Expr { expr: Expr },
    Return { value: Option<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    IntLit { value: i32 },
    BoolLit { value: bool },
    VarRef { name: String, ty: Type },
    This { ty: Type },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: Type,
    },
    MethodCall {
        target: Box<Expr>,
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
        ty: Type,
    },
    NewObject { class_name: String, ty: Type },
    NewArray { size: Box<Expr>, ty: Type },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
        ty: Type,
    },
    Length { array: Box<Expr>, ty: Type },
}

impl Expr {
    pub fn int(value: i32) -> Self {
        Expr::IntLit { value }
    }

    pub fn boolean(value: bool) -> Self {
        Expr::BoolLit { value }
    }

    pub fn var(name: impl Into<String>, ty: Type) -> Self {
        Expr::VarRef {
            name: name.into(),
            ty,
        }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr, ty: Type) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        }
    }

    pub fn call(target: Expr, name: impl Into<String>, args: Vec<Expr>, ty: Type) -> Self {
        Expr::MethodCall {
            target: Box::new(target),
            name: name.into(),
            args,
            ty,
        }
    }

    /// Resolved type of the expression.
    pub fn ty(&self) -> Type {
        match self {
            Expr::IntLit { .. } => Type::int(),
            Expr::BoolLit { .. } => Type::boolean(),
            Expr::VarRef { ty, .. }
            | Expr::This { ty }
            | Expr::Binary { ty, .. }
            | Expr::MethodCall { ty, .. }
            | Expr::NewObject { ty, .. }
            | Expr::NewArray { ty, .. }
            | Expr::ArrayAccess { ty, .. }
            | Expr::Length { ty, .. } => ty.clone(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::IntLit { .. } | Expr::BoolLit { .. })
    }
}

/// Severity of a diagnostic produced by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub severity: Severity,
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub column: usize,
    pub message: String,
}

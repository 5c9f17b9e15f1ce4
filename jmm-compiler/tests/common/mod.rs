#![allow(dead_code)]

use jmm_compiler::ir::ast::*;
use jmm_compiler::{compile_to_ir, compile_to_jasmin, CompilerConfig, TypedUnit};
use std::collections::HashMap;

// ── Tree builders ────────────────────────────────────────────────────────

pub fn program(name: &str, imports: &[&str], fields: Vec<VarDecl>, methods: Vec<MethodDecl>) -> Program {
    Program {
        imports: imports.iter().map(|s| s.to_string()).collect(),
        class: ClassDecl {
            name: name.to_string(),
            super_class: None,
            fields,
            methods,
        },
    }
}

pub fn method(
    name: &str,
    ret: Type,
    params: Vec<VarDecl>,
    locals: Vec<VarDecl>,
    body: Vec<Stmt>,
) -> MethodDecl {
    MethodDecl {
        name: name.to_string(),
        is_public: true,
        is_static: false,
        return_type: ret,
        params,
        locals,
        body,
    }
}

pub fn main_method(locals: Vec<VarDecl>, body: Vec<Stmt>) -> MethodDecl {
    MethodDecl {
        is_static: true,
        ..method(
            "main",
            Type::void(),
            vec![VarDecl::new("args", Type::string_array())],
            locals,
            body,
        )
    }
}

pub fn int_var(name: &str) -> VarDecl {
    VarDecl::new(name, Type::int())
}

pub fn assign(name: &str, ty: Type, value: Expr) -> Stmt {
    Stmt::Assign {
        name: name.to_string(),
        ty,
        value,
    }
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::Return { value: Some(value) }
}

pub fn int_ref(name: &str) -> Expr {
    Expr::var(name, Type::int())
}

pub fn add(l: Expr, r: Expr) -> Expr {
    Expr::binary(BinOp::Add, l, r, Type::int())
}

pub fn this(class: &str) -> Expr {
    Expr::This {
        ty: Type::class(class),
    }
}

/// Static call on an imported class, e.g. `io.println(x)`.
pub fn imported_call(class: &str, name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(Expr::var(class, Type::imported()), name, args, Type::imported())
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr { expr }
}

// ── Compilation helpers ──────────────────────────────────────────────────

pub fn config(optimize: bool, registers: Option<i32>) -> CompilerConfig {
    CompilerConfig {
        optimize,
        register_allocation: registers,
    }
}

pub fn ir_text(p: Program) -> String {
    let unit = TypedUnit::new(p);
    compile_to_ir(&unit, &CompilerConfig::default())
        .expect("should lower")
        .to_lines()
        .join("\n")
}

pub fn jasmin(p: Program, registers: Option<i32>) -> String {
    let unit = TypedUnit::new(p);
    compile_to_jasmin(&unit, &config(false, registers)).expect("should compile")
}

pub fn load_sample(name: &str) -> TypedUnit {
    let path = format!("../samples/{name}");
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"));
    TypedUnit::from_json(&text).unwrap_or_else(|e| panic!("parsing {path}: {e}"))
}

/// Trimmed body lines of the method `name` (directives included).
pub fn method_body(asm: &str, name: &str) -> Vec<String> {
    let header = format!(" {name}(");
    let mut lines = asm.lines().skip_while(|l| !(l.starts_with(".method") && l.contains(&header)));
    lines.next().unwrap_or_else(|| panic!("method {name} not found in:\n{asm}"));
    lines
        .take_while(|l| *l != ".end method")
        .map(|l| l.trim().to_string())
        .collect()
}

pub fn limit(body: &[String], which: &str) -> i32 {
    let prefix = format!(".limit {which} ");
    body.iter()
        .find_map(|l| l.strip_prefix(&prefix))
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("no .limit {which} in {body:?}"))
}

// ── Stack simulator ──────────────────────────────────────────────────────

/// Number of argument slots in a method descriptor such as `(I[Ljava/lang/String;Z)V`.
fn descriptor_args(desc: &str) -> (i32, bool) {
    let open = desc.find('(').expect("descriptor");
    let close = desc.find(')').expect("descriptor");
    let params = &desc[open + 1..close];
    let returns = !desc[close + 1..].starts_with('V');

    let mut count = 0;
    let mut chars = params.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => continue,
            'L' => {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
                count += 1;
            }
            _ => count += 1,
        }
    }
    (count, returns)
}

fn effect(line: &str) -> i32 {
    let mut parts = line.split_whitespace();
    let op = parts.next().unwrap_or("");
    let operand = parts.next().unwrap_or("");
    match op {
        o if o.starts_with("iload") || o.starts_with("aload") => 1,
        o if o.starts_with("istore") || o.starts_with("astore") => -1,
        o if o.starts_with("iconst") => 1,
        "bipush" | "sipush" | "ldc" | "new" => 1,
        "iadd" | "isub" | "imul" | "idiv" | "iand" | "ior" | "pop" => -1,
        "ireturn" | "areturn" => -1,
        "return" | "goto" | "getfield" | "newarray" | "anewarray" => 0,
        "putfield" => -2,
        "if_icmplt" => -2,
        "invokestatic" | "invokevirtual" | "invokespecial" => {
            let (args, returns) = descriptor_args(operand);
            let receiver = i32::from(op != "invokestatic");
            i32::from(returns) - args - receiver
        }
        other => panic!("simulator does not know '{other}'"),
    }
}

/// Replay a method body and return the maximum operand-stack depth reached
/// on any path. Panics on underflow or inconsistent depths at a label.
pub fn simulate_max_stack(body: &[String]) -> i32 {
    let mut depth: Option<i32> = Some(0);
    let mut at_label: HashMap<String, i32> = HashMap::new();
    let mut max = 0;

    for line in body.iter().filter(|l| !l.starts_with('.') && !l.is_empty()) {
        if let Some(label) = line.strip_suffix(':') {
            let recorded = at_label.get(label).copied();
            depth = match (depth, recorded) {
                (Some(d), Some(r)) => {
                    assert_eq!(d, r, "inconsistent depth at {label}");
                    Some(d)
                }
                (d, r) => d.or(r),
            };
            continue;
        }
        let d = depth.expect("unreachable code without a label");
        let next = d + effect(line);
        assert!(next >= 0, "stack underflow at '{line}'");
        max = max.max(next);

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("if_icmplt"), Some(target)) => {
                at_label.insert(target.to_string(), next);
                depth = Some(next);
            }
            (Some("goto"), Some(target)) => {
                at_label.insert(target.to_string(), next);
                depth = None;
            }
            _ => depth = Some(next),
        }
    }
    max
}

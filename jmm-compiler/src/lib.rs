pub mod backend;
pub mod config;
pub mod ir;

pub use config::CompilerConfig;

use ir::ast::{Program, Report, Severity};
use ir::symbol_table::SymbolTable;
use ir::ClassUnit;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Unimplemented construct: {0}")]
    Unimplemented(String),

    #[error("Register budget exceeded in '{method}': '{variable}' needs more than {budget} register(s)")]
    BudgetExceeded {
        method: String,
        variable: String,
        budget: usize,
    },

    #[error("Malformed IR: {0}")]
    MalformedIr(String),

    #[error("Front end reported {count} error(s), first at {line}:{column}: {message}")]
    FrontEnd {
        count: usize,
        line: usize,
        column: usize,
        message: String,
    },
}

/// A typed, validated compilation unit as handed over by the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedUnit {
    pub program: Program,
    /// Built from `program` when absent.
    #[serde(default)]
    pub table: Option<SymbolTable>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl TypedUnit {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            table: None,
            reports: Vec::new(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn symbol_table(&self) -> SymbolTable {
        self.table
            .clone()
            .unwrap_or_else(|| SymbolTable::from_program(&self.program))
    }
}

/// Refuse units whose front-end reports contain errors.
pub fn check_reports(reports: &[Report]) -> Result<(), CompileError> {
    let mut errors = reports.iter().filter(|r| r.severity == Severity::Error);
    match errors.next() {
        Some(first) => Err(CompileError::FrontEnd {
            count: 1 + errors.count(),
            line: first.line,
            column: first.column,
            message: first.message.clone(),
        }),
        None => Ok(()),
    }
}

pub fn compile_to_ir(unit: &TypedUnit, config: &CompilerConfig) -> Result<ClassUnit, CompileError> {
    check_reports(&unit.reports)?;
    let table = unit.symbol_table();

    let program = if config.optimize {
        ir::opt::optimize(unit.program.clone(), &table)
    } else {
        unit.program.clone()
    };

    let class = ir::ir_generator::lower(&program, &table)?;
    info!(
        "lowered class '{}' ({} method(s))",
        class.name,
        class.methods.len()
    );
    Ok(class)
}

/// Compile a typed unit directly to Jasmin assembly.
pub fn compile_to_jasmin(unit: &TypedUnit, config: &CompilerConfig) -> Result<String, CompileError> {
    let mut class = compile_to_ir(unit, config)?;
    backend::compile_ir_to_jasmin(&mut class, config.register_budget())
}

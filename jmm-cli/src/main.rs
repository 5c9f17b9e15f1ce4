use anyhow::{Context, Result};
use clap::Parser;
use jmm_compiler::{backend, compile_to_ir, CompilerConfig, TypedUnit};
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jmm-cli")]
#[command(about = "Java-- compiler backend: typed tree to Jasmin")]
struct Args {
    /// Path to the typed unit (JSON: program, optional symbol table, reports)
    file: PathBuf,

    /// Emit IR. If none of --ir/--asm/--both is given, defaults to --asm.
    #[arg(long)]
    ir: bool,

    /// Emit Jasmin assembly
    #[arg(long)]
    asm: bool,

    /// Emit both IR and Jasmin assembly
    #[arg(long)]
    both: bool,

    /// Run constant propagation and folding before lowering
    #[arg(short = 'o', long)]
    optimize: bool,

    /// Register budget for graph-coloring allocation (absent or <= 0 disables it)
    #[arg(short = 'r', long = "registers", allow_negative_numbers = true)]
    registers: Option<i32>,

    /// JSON config file (`optimize`, `registerAllocation`); flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write output to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<CompilerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config '{}'", path.display()))?;
            CompilerConfig::from_json(&text)
                .with_context(|| format!("parsing config '{}'", path.display()))?
        }
        None => CompilerConfig::default(),
    };
    if args.optimize {
        config.optimize = true;
    }
    if args.registers.is_some() {
        config.register_allocation = args.registers;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("reading '{}'", args.file.display()))?;
    let unit = TypedUnit::from_json(&text)
        .with_context(|| format!("parsing typed unit '{}'", args.file.display()))?;

    // Determine outputs
    let mut want_ir = args.ir;
    let mut want_asm = args.asm;
    if args.both {
        want_ir = true;
        want_asm = true;
    }
    if !want_ir && !want_asm {
        want_asm = true;
    } // default to assembly

    let mut class = compile_to_ir(&unit, &config).context("compilation failed")?;

    let mut out = String::new();
    if want_ir {
        for line in class.to_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }
    if want_asm {
        let asm = backend::compile_ir_to_jasmin(&mut class, config.register_budget())
            .context("code generation failed")?;
        out.push_str(&asm);
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &out).with_context(|| format!("writing '{}'", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => print!("{out}"),
    }
    Ok(())
}

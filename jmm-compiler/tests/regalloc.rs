mod common;

use common::*;
use jmm_compiler::backend::liveness::{self, VarSet};
use jmm_compiler::backend::regalloc::{self, RegisterAssignment};
use jmm_compiler::backend::InterferenceGraph;
use jmm_compiler::ir::ast::*;
use jmm_compiler::ir::{ClassUnit, IrType, VarDescriptor, VarScope};
use jmm_compiler::{compile_to_ir, compile_to_jasmin, CompileError, CompilerConfig, TypedUnit};

fn lowered(name: &str) -> ClassUnit {
    compile_to_ir(&load_sample(name), &CompilerConfig::default()).expect("sample should lower")
}

/// a := 1; b := 2; c := 3; t := a + b; u := t + c; return u
fn triangle() -> Program {
    let locals = ["a", "b", "c", "t", "u"].into_iter().map(int_var).collect();
    program(
        "Tri",
        &[],
        vec![],
        vec![method(
            "f",
            Type::int(),
            vec![],
            locals,
            vec![
                assign("a", Type::int(), Expr::int(1)),
                assign("b", Type::int(), Expr::int(2)),
                assign("c", Type::int(), Expr::int(3)),
                assign("t", Type::int(), add(int_ref("a"), int_ref("b"))),
                assign("u", Type::int(), add(int_ref("t"), int_ref("c"))),
                ret(int_ref("u")),
            ],
        )],
    )
}

// ── Liveness ─────────────────────────────────────────────────────────────

#[test]
fn liveness_satisfies_dataflow_equations() {
    for sample in ["simple.json", "fields.json", "constants.json"] {
        let class = lowered(sample);
        for method in &class.methods {
            let info = liveness::analyze(method);
            assert_eq!(info.len(), method.instrs.len());
            for idx in 0..info.len() {
                let mut expected_out = VarSet::new();
                for &s in method.cfg.successors(idx) {
                    expected_out.extend(info.live_in(s).iter().cloned());
                }
                assert_eq!(info.live_out(idx), &expected_out, "{sample}::{} out[{idx}]", method.name);

                let mut expected_in = info.uses(idx).clone();
                for v in info.live_out(idx) {
                    if info.def(idx) != Some(v.as_str()) {
                        expected_in.insert(v.clone());
                    }
                }
                assert_eq!(info.live_in(idx), &expected_in, "{sample}::{} in[{idx}]", method.name);
            }
        }
    }
}

#[test]
fn liveness_is_a_fixed_point() {
    for sample in ["simple.json", "fields.json", "constants.json"] {
        let class = lowered(sample);
        for method in &class.methods {
            let first = liveness::analyze(method);
            let again = liveness::analyze(method);
            assert_eq!(first.len(), again.len());
            for idx in 0..first.len() {
                assert_eq!(first.live_in(idx), again.live_in(idx), "{sample}::{} in[{idx}]", method.name);
                assert_eq!(first.live_out(idx), again.live_out(idx), "{sample}::{} out[{idx}]", method.name);
            }
        }
    }
}

#[test]
fn nothing_is_live_on_entry_of_straight_line_code() {
    // Every local is written before it is read, so only `this` and
    // parameters may be live at the first instruction.
    let class = lowered("fields.json");
    for method in &class.methods {
        let info = liveness::analyze(method);
        for v in info.live_in(0) {
            let scope = method.var_table[v].scope;
            assert!(
                matches!(scope, VarScope::Param | VarScope::This),
                "{v} live on entry of {}",
                method.name
            );
        }
    }
}

// ── Interference graph ───────────────────────────────────────────────────

#[test]
fn graph_is_symmetric_and_irreflexive() {
    for sample in ["simple.json", "fields.json", "constants.json"] {
        let class = lowered(sample);
        for method in &class.methods {
            let graph = InterferenceGraph::build(&liveness::analyze(method));
            for n in graph.nodes() {
                assert!(!graph.interferes(n, n), "self edge on {n}");
                for m in graph.neighbors(n) {
                    assert!(graph.interferes(m, n), "{n} -> {m} is not mirrored");
                }
            }
        }
    }
}

#[test]
fn triangle_graph_edges() {
    let unit = TypedUnit::new(triangle());
    let class = compile_to_ir(&unit, &CompilerConfig::default()).unwrap();
    let graph = InterferenceGraph::build(&liveness::analyze(&class.methods[0]));
    assert!(graph.interferes("a", "b"));
    assert!(graph.interferes("a", "c"));
    assert!(graph.interferes("b", "c"));
    assert!(graph.interferes("t", "c"));
    assert!(!graph.interferes("a", "t"));
    assert!(!graph.interferes("u", "t"));
    assert_eq!(graph.degree("u"), 0);
}

// ── Coloring ─────────────────────────────────────────────────────────────

fn assert_valid_coloring(graph: &InterferenceGraph, colors: &RegisterAssignment, k: usize) {
    for (name, color) in colors.iter() {
        assert!(color < k, "{name} got color {color} with k = {k}");
        for other in graph.neighbors(name) {
            if let Some(c) = colors.color(other) {
                assert_ne!(c, color, "{name} and {other} interfere but share color {c}");
            }
        }
    }
}

#[test]
fn coloring_is_valid_for_samples() {
    let k = 8;
    for sample in ["simple.json", "fields.json", "constants.json"] {
        let mut class = lowered(sample);
        for method in &mut class.methods {
            let graph = InterferenceGraph::build(&liveness::analyze(method));
            let colors = regalloc::allocate(method, k)
                .expect("allocation should succeed")
                .expect("positive budget allocates");
            assert_valid_coloring(&graph, &colors, k);
        }
    }
}

#[test]
fn disjoint_lifetimes_fit_in_one_register() {
    let asm = compile_to_jasmin(&load_sample("simple.json"), &config(false, Some(1))).unwrap();
    let main = method_body(&asm, "main");
    assert!(main.contains(&"astore_1".to_string()));
    assert!(main.contains(&"istore_1".to_string()));
    assert!(main.contains(&"iload_1".to_string()));
    assert_eq!(limit(&main, "locals"), 2);
}

#[test]
fn temporaries_share_a_slot() {
    let mut class = lowered("fields.json");
    let bump = class.method_mut("bump").unwrap();
    regalloc::allocate(bump, 1).unwrap();
    for (name, desc) in &bump.var_table {
        if name.starts_with("tmp") {
            assert_eq!(desc.slot, 2, "{name} should sit right after this and step");
        }
    }
}

/// a := 1; b := 2; t := a + b; c := t + 1; return c
fn overlapping_pair() -> Program {
    let locals = ["a", "b", "c", "t"].into_iter().map(int_var).collect();
    program(
        "Pair",
        &[],
        vec![],
        vec![method(
            "f",
            Type::int(),
            vec![],
            locals,
            vec![
                assign("a", Type::int(), Expr::int(1)),
                assign("b", Type::int(), Expr::int(2)),
                assign("t", Type::int(), add(int_ref("a"), int_ref("b"))),
                assign("c", Type::int(), add(int_ref("t"), Expr::int(1))),
                ret(int_ref("c")),
            ],
        )],
    )
}

#[test]
fn overlapping_pair_fits_in_two_registers() {
    let mut class = compile_to_ir(&TypedUnit::new(overlapping_pair()), &CompilerConfig::default()).unwrap();
    let f = class.method_mut("f").unwrap();
    let graph = InterferenceGraph::build(&liveness::analyze(f));
    assert!(graph.interferes("a", "b"));
    assert!(!graph.interferes("c", "a"));
    assert!(!graph.interferes("c", "b"));

    let colors = regalloc::allocate(f, 2).unwrap().unwrap();
    assert_valid_coloring(&graph, &colors, 2);
    let (a, b, c) = (
        colors.color("a").unwrap(),
        colors.color("b").unwrap(),
        colors.color("c").unwrap(),
    );
    assert_ne!(a, b);
    assert!(c == a || c == b, "c should reuse a color of the pair");
    assert_eq!(colors.registers_used(), 2);

    let asm = compile_to_jasmin(&TypedUnit::new(overlapping_pair()), &config(false, Some(2))).unwrap();
    // this + two colors
    assert_eq!(limit(&method_body(&asm, "f"), "locals"), 3);
}

#[test]
fn forced_conflict_exceeds_budget_of_two() {
    let unit = TypedUnit::new(triangle());
    let err = compile_to_jasmin(&unit, &config(false, Some(2))).unwrap_err();
    match err {
        CompileError::BudgetExceeded { method, budget, .. } => {
            assert_eq!(method, "f");
            assert_eq!(budget, 2);
        }
        other => panic!("expected BudgetExceeded, got {other:?}"),
    }
}

#[test]
fn triangle_fits_in_three_registers() {
    let unit = TypedUnit::new(triangle());
    let asm = compile_to_jasmin(&unit, &config(false, Some(3))).unwrap();
    let body = method_body(&asm, "f");
    // this + three colors
    assert_eq!(limit(&body, "locals"), 4);
}

// ── Slot offsets and cleanup ─────────────────────────────────────────────

#[test]
fn colors_are_offset_past_receiver_and_parameters() {
    let mut class = lowered("simple.json");
    let add = class.method_mut("add").unwrap();
    let colors = regalloc::allocate(add, 1).unwrap().unwrap();
    assert_eq!(colors.color("c"), Some(0));
    assert_eq!(add.var_table["c"].slot, 3);
    assert_eq!(add.var_table["a"].slot, 1);
    assert_eq!(add.var_table["b"].slot, 2);
    assert_eq!(add.var_table["this"].slot, 0);
}

#[test]
fn zero_budget_keeps_default_slots() {
    let mut class = lowered("fields.json");
    let before = class.method("bump").unwrap().var_table.clone();
    let bump = class.method_mut("bump").unwrap();
    assert!(regalloc::allocate(bump, 0).unwrap().is_none());
    assert_eq!(bump.var_table, before);
}

#[test]
fn lowered_temporaries_survive_cleanup() {
    let mut class = lowered("fields.json");
    let bump = class.method_mut("bump").unwrap();
    let temps: Vec<String> = bump.var_table.keys().filter(|n| n.starts_with("tmp")).cloned().collect();
    assert!(!temps.is_empty());

    regalloc::allocate(bump, 1).unwrap();
    for t in &temps {
        assert!(bump.var_table.contains_key(t), "{t} was removed");
    }
}

#[test]
fn cleanup_drops_uncolored_temporaries_only() {
    let mut class = lowered("simple.json");
    let main = class.method_mut("main").unwrap();
    for name in ["tmp99", "unused"] {
        main.var_table.insert(
            name.to_string(),
            VarDescriptor {
                ty: IrType::Int,
                scope: VarScope::Local,
                slot: 7,
            },
        );
    }

    let colors = regalloc::allocate(main, 4).unwrap().unwrap();
    assert!(!main.var_table.contains_key("tmp99"));
    assert!(main.var_table.contains_key("unused"));

    let snapshot = main.var_table.clone();
    regalloc::cleanup_dead_temps(main, &colors);
    assert_eq!(main.var_table, snapshot, "cleanup must be idempotent");
}

use std::{env, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use parsetab::{
    lr::{lalr, Automaton, LR0Item, LR1Item},
    Grammar,
};

criterion_main!(benches);
criterion_group!(benches, bench_automata);

fn bench_automata(c: &mut Criterion) {
    bench_automaton_gen(c, "expr");
    bench_automaton_gen(c, "pointers");
    bench_automaton_gen(c, "let_in");
    bench_automaton_gen(c, "lr1");
}

fn bench_automaton_gen(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar =
        Grammar::from_file(project_root.join(format!("tests/grammars/{}.cfg", grammar_name)))
            .unwrap();

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("LR0", |b| {
        b.iter(|| Automaton::<LR0Item>::generate(&grammar).unwrap());
    });
    group.bench_function("LR1", |b| {
        b.iter(|| Automaton::<LR1Item>::generate(&grammar).unwrap());
    });
    group.bench_function("LALR1", |b| {
        b.iter(|| lalr::lalr1(&Automaton::<LR1Item>::generate(&grammar).unwrap()));
    });
    group.finish();
}

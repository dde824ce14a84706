//! Large Expression Benchmark
//!
//! Benchmarks for expressions with many mixed terms (N >= 300):
//! parsing, evaluation, pattern matching and solving.

use criterion::{Criterion, criterion_group, criterion_main};
use std::fmt::Write;
use std::hint::black_box;
use symb_algebra::core::Ring;
use symb_algebra::{Expr, evaluate, parse, solve};

// =============================================================================
// Complex Expression Generator
// =============================================================================

/// Generates a complex mixed expression with N terms
/// Includes: polynomials, trig, exponentials, fractions, and nested functions
fn generate_mixed_complex(n: usize) -> String {
    let mut s = String::with_capacity(n * 50);
    for i in 1..=n {
        if i > 1 {
            if i % 3 == 1 {
                s.push_str(" - ");
            } else {
                s.push_str(" + ");
            }
        }

        // Mix term types based on index
        let _ = match i % 5 {
            0 => write!(s, "{}*x^{}", i, i % 10 + 1),
            1 => write!(s, "Sin({}*x)*Cos(x)", i),
            2 => write!(s, "(Exp(x/{}) + Ln(x + {}))", i, i),
            3 => write!(s, "(x^2 + {})/(x + {})", i, i),
            _ => write!(s, "Sin(Exp(x) + {})", i),
        };
    }
    s
}

/// A dense `n x n` system with unknowns `x0..x(n-1)` and unit diagonal dominance
fn generate_system(n: usize) -> (Vec<Expr>, Vec<Expr>) {
    let mut equations = Vec::with_capacity(n);
    for i in 0..n {
        let mut s = String::new();
        for j in 0..n {
            let c = if i == j { n + 1 } else { (i + 2 * j) % 5 + 1 };
            let _ = write!(s, "{}{}*x{}", if j > 0 { " + " } else { "" }, c, j);
        }
        let _ = write!(s, " == b{i}");
        if let Ok(eq) = parse(&s) {
            equations.push(eq);
        }
    }
    let unknowns = (0..n).map(|j| Expr::variable(&format!("x{j}"))).collect();
    (equations, unknowns)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_large_expressions(c: &mut Criterion) {
    let mut group = c.benchmark_group("complex_expressions_300");
    group.sample_size(10); // Very large exprs, reduce samples further
    group.measurement_time(std::time::Duration::from_secs(15));

    let mixed_str = generate_mixed_complex(300);
    let Ok(mixed) = parse(&mixed_str) else {
        return;
    };

    group.bench_function("parse", |b| b.iter(|| parse(black_box(&mixed_str))));
    group.bench_function("evaluate", |b| b.iter(|| evaluate(black_box(&mixed))));
    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");

    let x = Expr::variable("x");
    let a = Expr::pattern_variable("A", Ring::Reals, {
        let x = x.clone();
        move |e| !e.depends_on(&x)
    });
    let n = Expr::variable_in("n", Ring::Integers);
    let monomial = Expr::product(vec![a, Expr::power(x.clone(), n)]);
    let pre = [Expr::arrow(x.clone(), x)];

    let Ok(target) = parse("3*y*z*x^7") else {
        return;
    };
    group.bench_function("monomial", |b| {
        b.iter(|| black_box(&monomial).matches(black_box(&target), &pre))
    });

    let Ok(linear) = parse("a*x + b") else {
        return;
    };
    let Ok(poly) = parse("5*x + y + z^2 + 7 + Sin(y)") else {
        return;
    };
    group.bench_function("linear_in_sum", |b| {
        b.iter(|| black_box(&linear).matches(black_box(&poly), &pre))
    });
    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    group.sample_size(10);

    for n in [4, 8] {
        let (equations, unknowns) = generate_system(n);
        group.bench_function(format!("dense_symbolic_{n}"), |b| {
            b.iter(|| solve(black_box(&equations), black_box(&unknowns)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_large_expressions, bench_matching, bench_solve);
criterion_main!(benches);

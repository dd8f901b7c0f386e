//! Integration Tests for Formulas
//!
//! Parses formulas through the public API and evaluates them against a
//! closed registry (pure arithmetic) and against libm (function calls).

use num_complex::Complex64;
use pixcall::{CallError, ComplexRegistry, Formula, FormulaError, Numeric, RealRegistry};

#[cfg(target_os = "linux")]
const LIBM: &str = "libm.so.6";

#[test]
fn test_pure_arithmetic_needs_no_library() {
    let mut registry = ComplexRegistry::new();
    let formula = Formula::parse("(x1 + x2) * 0.5 - _1").unwrap();
    assert_eq!(formula.arity(), 2);

    let v = formula
        .eval(
            &mut registry,
            &[Complex64::from_real(3.0), Complex64::from_real(5.0)],
        )
        .unwrap();
    assert_eq!(v, Complex64::new(4.0, -1.0));
}

#[test]
fn test_real_domain_arithmetic() {
    let mut registry = RealRegistry::new();
    let formula = Formula::parse("x1^2 / 4 + 1").unwrap();
    assert_eq!(formula.eval(&mut registry, &[6.0]).unwrap(), 10.0);
}

#[test]
fn test_call_on_closed_registry() {
    let mut registry = RealRegistry::new();
    let formula = Formula::parse("sin(x1)").unwrap();
    assert!(matches!(
        formula.check(&mut registry, 1),
        Err(FormulaError::Call {
            source: CallError::NotOpen,
            ..
        })
    ));
}

#[cfg(target_os = "linux")]
#[test]
fn test_trig_identity_through_libm() {
    let mut registry = RealRegistry::new();
    if registry.open(LIBM, 4).is_err() {
        eprintln!("Skipping: {} not available", LIBM);
        return;
    }

    let formula = Formula::parse("SIN(x1)^2 + cos(x1)^2;").unwrap();
    formula.check(&mut registry, 1).unwrap();
    assert_eq!(registry.cached(1), 2);

    for step in 0..50 {
        let x = step as f64 * 0.1;
        let v = formula.eval(&mut registry, &[x]).unwrap();
        assert!((v - 1.0).abs() < 1e-12, "x = {}: {}", x, v);
    }
    assert_eq!(registry.cached(1), 2);
}

#[cfg(target_os = "linux")]
#[test]
fn test_complex_calls_through_libm() {
    let mut registry = ComplexRegistry::new();
    if registry.open(LIBM, 4).is_err() {
        eprintln!("Skipping: {} not available", LIBM);
        return;
    }

    let formula = Formula::parse("cpow(csqrt(x1), 2)").unwrap();
    assert_eq!(formula.functions(), vec![("cpow", 2), ("csqrt", 1)]);

    let x = Complex64::new(-3.0, 4.0);
    let v = formula.eval(&mut registry, &[x]).unwrap();
    assert!((v - x).norm() < 1e-9);
}

#[cfg(target_os = "linux")]
#[test]
fn test_unknown_function_through_libm() {
    let mut registry = RealRegistry::new();
    if registry.open(LIBM, 4).is_err() {
        eprintln!("Skipping: {} not available", LIBM);
        return;
    }

    let formula = Formula::parse("sepia(x1, 2)").unwrap();
    let err = formula.check(&mut registry, 1).unwrap_err();
    assert!(err
        .to_string()
        .contains("error calling 2 argument function sepia"));
    assert_eq!(registry.cached(2), 0);
}

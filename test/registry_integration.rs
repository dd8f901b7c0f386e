//! Integration Tests for the Registry
//!
//! Loads real shared libraries through `DynamicLibrary`:
//! - libm's complex functions (`csqrt`, `cpow`) in the complex domain
//! - libm's real functions (`sin`, `pow`) in the real domain
//! - open failures and the closed-registry status

use std::path::PathBuf;

use num_complex::Complex64;
use pixcall::registry::library_filename;
use pixcall::{ComplexRegistry, Numeric, OpenError, RealRegistry, Status};

#[cfg(target_os = "linux")]
const LIBM: &str = "libm.so.6";

/// The reference kernel's shared library, if cargo has built it
fn kernel_library() -> Option<PathBuf> {
    // target/<profile>/deps/<this test>
    let deps = std::env::current_exe().ok()?.parent()?.to_path_buf();
    let name = library_filename("pixcall_kernel");
    [deps.join(&name), deps.parent()?.join(&name)]
        .into_iter()
        .find(|path| path.is_file())
}

// =============================================================================
// Open / Close
// =============================================================================

#[test]
fn test_open_missing_library() {
    let mut registry = ComplexRegistry::new();
    let err = registry
        .open("/nonexistent/libnothing_here.so", 16)
        .unwrap_err();

    assert!(matches!(err, OpenError::LibraryLoadFailed { .. }));
    assert!(err.to_string().contains("libnothing_here.so"));
    assert!(!registry.is_open());
}

#[test]
fn test_zero_capacity_rejected() {
    let mut registry = RealRegistry::new();
    assert!(matches!(
        registry.open("/nonexistent/libnothing_here.so", 0),
        Err(OpenError::CapacityInvalid(0))
    ));
}

#[test]
fn test_calls_before_open() {
    let mut registry = ComplexRegistry::new();
    let outcome = registry.call1("csqrt", Complex64::from_real(4.0));

    assert_eq!(outcome.status, Status::NotOpen);
    assert_eq!(outcome.status.code(), 1);
    assert_eq!(outcome.value, Complex64::new(0.0, 0.0));
}

// =============================================================================
// libm
// =============================================================================

#[cfg(target_os = "linux")]
#[test]
fn test_libm_complex_functions() {
    let mut registry = ComplexRegistry::new();
    if registry.open(LIBM, 8).is_err() {
        eprintln!("Skipping: {} not available", LIBM);
        return;
    }
    assert_eq!(registry.path(), Some(std::path::Path::new(LIBM)));

    let root = registry
        .call1("csqrt", Complex64::from_real(-4.0))
        .into_result()
        .unwrap();
    assert!((root - Complex64::new(0.0, 2.0)).norm() < 1e-12);

    let power = registry
        .call2("cpow", Complex64::new(0.0, 1.0), Complex64::from_real(2.0))
        .into_result()
        .unwrap();
    assert!((power - Complex64::new(-1.0, 0.0)).norm() < 1e-12);

    assert_eq!(registry.cached(1), 1);
    assert_eq!(registry.cached(2), 1);

    let missing = registry.call1("no_such_function_anywhere", Complex64::from_real(1.0));
    assert_eq!(missing.status, Status::SymbolNotFound);
    assert_eq!(registry.cached(1), 1);
}

#[cfg(target_os = "linux")]
#[test]
fn test_libm_real_functions() {
    let mut registry = RealRegistry::new();
    if registry.open(LIBM, 2).is_err() {
        eprintln!("Skipping: {} not available", LIBM);
        return;
    }

    let half_pi = std::f64::consts::FRAC_PI_2;
    for _ in 0..10 {
        let v = registry.call1("sin", half_pi).into_result().unwrap();
        assert!((v - 1.0).abs() < 1e-12);
    }

    let v = registry.call2("pow", 2.0, 10.0).into_result().unwrap();
    assert_eq!(v, 1024.0);

    // Capacity 2: a third arity-1 name is refused
    registry.call1("cos", 0.0).into_result().unwrap();
    let full = registry.call1("tan", 0.0);
    assert_eq!(full.status, Status::CacheFull);
    assert_eq!(full.value, 0.0);

    // Cached names still work
    assert!(registry.call1("cos", 0.0).is_success());
}

#[cfg(target_os = "linux")]
#[test]
fn test_libm_reopen_clears_caches() {
    let mut registry = RealRegistry::new();
    if registry.open(LIBM, 4).is_err() {
        eprintln!("Skipping: {} not available", LIBM);
        return;
    }

    registry.call1("sin", 0.0).into_result().unwrap();
    assert_eq!(registry.cached(1), 1);

    registry.open(LIBM, 4).unwrap();
    assert_eq!(registry.cached(1), 0);

    registry.close();
    assert_eq!(registry.call1("sin", 0.0).status, Status::NotOpen);
}

// =============================================================================
// Reference kernel
// =============================================================================

#[test]
fn test_kernel_through_dlopen() {
    let Some(path) = kernel_library() else {
        eprintln!("Skipping: pixcall-kernel shared library not built");
        return;
    };

    let mut registry = ComplexRegistry::new();
    registry.open(&path, 4).unwrap();

    let x = Complex64::from_real(0.73);
    let n = Complex64::from_real(4.0);
    for _ in 0..100 {
        let v = registry.call2("toon", x, n).into_result().unwrap();
        assert_eq!(v, Complex64::new(0.75, 0.0));
    }
    assert_eq!(registry.cached(2), 1);

    let v = registry
        .call3(
            "saturate",
            Complex64::new(1.5, 2.0),
            Complex64::from_real(0.0),
            Complex64::from_real(1.0),
        )
        .into_result()
        .unwrap();
    assert_eq!(v, Complex64::new(1.0, 0.0));

    assert_eq!(registry.call1("sepia", x).status, Status::SymbolNotFound);
}

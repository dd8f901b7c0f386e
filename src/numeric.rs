//! Numeric Domain
//!
//! The registry is generic over one numeric domain: plain `f64` for the real
//! lineage of math kernels, or [`Complex64`] for the complex lineage, where
//! real-valued curves are embedded with a zero imaginary part.
//!
//! # Trust barrier
//!
//! [`Invoke`] is the only place a resolved address is turned into a callable.
//! The registry never inspects what lives behind a symbol; a name called
//! under the wrong arity produces undefined numeric results, and that is the
//! caller's contract with the plugin.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::Complex64;
use num_traits::Zero;

use crate::registry::Symbol;

/// Call a resolved symbol with `N` arguments of the implementing type.
pub trait Invoke<const N: usize>: Sized {
    /// Call `symbol` as `extern "C" fn(Self, ...) -> Self` with `N` arguments.
    ///
    /// # Safety
    ///
    /// - `symbol` must point at a function taking exactly `N` parameters of
    ///   `Self` and returning `Self` with the C calling convention
    /// - the library that exported it must still be loaded
    unsafe fn invoke(symbol: Symbol<N>, args: [Self; N]) -> Self;
}

macro_rules! impl_invoke {
    ($ty:ty) => {
        impl Invoke<1> for $ty {
            unsafe fn invoke(symbol: Symbol<1>, [a]: [Self; 1]) -> Self {
                let f: extern "C" fn($ty) -> $ty = std::mem::transmute(symbol.raw().as_ptr());
                f(a)
            }
        }

        impl Invoke<2> for $ty {
            unsafe fn invoke(symbol: Symbol<2>, [a, b]: [Self; 2]) -> Self {
                let f: extern "C" fn($ty, $ty) -> $ty = std::mem::transmute(symbol.raw().as_ptr());
                f(a, b)
            }
        }

        impl Invoke<3> for $ty {
            unsafe fn invoke(symbol: Symbol<3>, [a, b, c]: [Self; 3]) -> Self {
                let f: extern "C" fn($ty, $ty, $ty) -> $ty =
                    std::mem::transmute(symbol.raw().as_ptr());
                f(a, b, c)
            }
        }

        impl Invoke<4> for $ty {
            unsafe fn invoke(symbol: Symbol<4>, [a, b, c, d]: [Self; 4]) -> Self {
                let f: extern "C" fn($ty, $ty, $ty, $ty) -> $ty =
                    std::mem::transmute(symbol.raw().as_ptr());
                f(a, b, c, d)
            }
        }
    };
}

impl_invoke!(f64);
impl_invoke!(Complex64);

/// A numeric domain the registry and the formula evaluator can work in.
pub trait Numeric:
    Copy
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + Zero
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Invoke<1>
    + Invoke<2>
    + Invoke<3>
    + Invoke<4>
    + 'static
{
    /// Short name used in diagnostics ("real" or "complex")
    const DOMAIN: &'static str;

    /// Embed a real literal
    fn from_real(value: f64) -> Self;

    /// Build a purely imaginary literal, if the domain has one
    fn imaginary(value: f64) -> Option<Self>;

    /// Raise `self` to `exponent`
    fn pow(self, exponent: Self) -> Self;

    /// Absolute value (modulus for complex numbers)
    fn modulus(self) -> f64;

    /// Real and imaginary parts
    fn parts(self) -> (f64, f64);
}

impl Numeric for f64 {
    const DOMAIN: &'static str = "real";

    fn from_real(value: f64) -> Self {
        value
    }

    fn imaginary(_value: f64) -> Option<Self> {
        None
    }

    fn pow(self, exponent: Self) -> Self {
        self.powf(exponent)
    }

    fn modulus(self) -> f64 {
        self.abs()
    }

    fn parts(self) -> (f64, f64) {
        (self, 0.0)
    }
}

impl Numeric for Complex64 {
    const DOMAIN: &'static str = "complex";

    fn from_real(value: f64) -> Self {
        Complex64::new(value, 0.0)
    }

    fn imaginary(value: f64) -> Option<Self> {
        Some(Complex64::new(0.0, value))
    }

    /// `powc`, except for a zero base: `0^0 = 1`, `0^w = inf` when
    /// `re(w) < 0` (as `f64::powf` gives), and `0` otherwise.
    fn pow(self, exponent: Self) -> Self {
        // powc goes through ln(0) for a zero base
        if self.is_zero() {
            if exponent.is_zero() {
                return Complex64::new(1.0, 0.0);
            }
            if exponent.re < 0.0 {
                return Complex64::new(f64::INFINITY, 0.0);
            }
            return Complex64::zero();
        }
        self.powc(exponent)
    }

    fn modulus(self) -> f64 {
        self.norm()
    }

    fn parts(self) -> (f64, f64) {
        (self.re, self.im)
    }
}

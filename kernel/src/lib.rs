//! Pixcall Reference Kernel
//!
//! Pixel-math functions exported with C linkage so a pixcall registry can load
//! them at runtime. Every function takes and returns `double complex`; the
//! real-valued curves are embedded with a zero imaginary part.
//!
//! Build with `cargo build -p pixcall-kernel` and pass the resulting
//! `libpixcall_kernel.so` to `pxf --lib`.

use num_complex::Complex64;
use std::f64::consts::{PI, SQRT_2};

/// Squared raised-cosine curve: `(0.5 * (cos(2πx) + 1))^2`.
#[no_mangle]
pub extern "C" fn func(arg: Complex64) -> Complex64 {
    let wave = ((arg * (2.0 * PI)).cos() + 1.0) * 0.5;
    wave.powf(2.0)
}

/// Posterize `arg` (expected in `[0, 1]`) into `n` levels.
///
/// The product is truncated toward zero on its real part, matching a C
/// `(int)` cast of a complex value.
#[no_mangle]
pub extern "C" fn toon(arg: Complex64, n: Complex64) -> Complex64 {
    let level = (arg * (n + 1.0)).re.trunc();
    Complex64::new(level, 0.0) / n
}

/// Radial vignette attenuation for a pixel at relative position `(x, y)`.
#[no_mangle]
pub extern "C" fn vingette(arg: Complex64, x: Complex64, y: Complex64) -> Complex64 {
    let hx = (x - 0.5) * SQRT_2;
    let hy = (y - 0.5) * SQRT_2;
    arg.sqrt() * (Complex64::new(1.0, 0.0) - (hx * hx + hy * hy).sqrt())
}

/// Periodic alpha mask: `(0.5 * (cos(period * arg + offset) + 1))^power`.
#[no_mangle]
pub extern "C" fn alpha(
    arg: Complex64,
    period: Complex64,
    offset: Complex64,
    power: Complex64,
) -> Complex64 {
    let wave = ((period * arg + offset).cos() + 1.0) * 0.5;
    wave.powc(power)
}

/// Clamp the real part of `arg` into `[lo, hi]`.
#[no_mangle]
pub extern "C" fn saturate(arg: Complex64, lo: Complex64, hi: Complex64) -> Complex64 {
    Complex64::new(arg.re.max(lo.re).min(hi.re), 0.0)
}

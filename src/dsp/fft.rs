use std::fmt::Debug;

use rustfft::num_complex::Complex;
use rustfft::num_traits::{Float, FloatConst, FromPrimitive};
use thiserror::Error;

/// Scalar types the transform can run over (`f32`, `f64`).
pub trait FftFloat: Float + FloatConst + FromPrimitive + Debug {}

impl<T> FftFloat for T where T: Float + FloatConst + FromPrimitive + Debug {}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FftError {
    #[error("transform length {0} is not a power of two")]
    NotPowerOfTwo(usize),
    #[error("transform length {0} is not representable in the sample type")]
    Unrepresentable(usize),
}

/// A discrete Fourier transform over power-of-two lengths, computed in place.
pub trait FourierTransform<T: FftFloat> {
    fn forward(&self, data: &mut [Complex<T>]) -> Result<(), FftError>;

    /// Inverse transform via conjugate, forward, conjugate, scale by 1/N.
    fn inverse(&self, data: &mut [Complex<T>]) -> Result<(), FftError> {
        check_len(data.len())?;
        if data.len() <= 1 {
            return Ok(());
        }
        conjugate(data);
        self.forward(data)?;
        conjugate(data);

        let n = T::from_usize(data.len()).ok_or(FftError::Unrepresentable(data.len()))?;
        for c in data.iter_mut() {
            *c = *c / n;
        }
        Ok(())
    }

    /// Forward transform of samples held as separate real and imaginary channels.
    /// Channels of different lengths are left untouched.
    fn forward_split(&self, real: &mut [T], imag: &mut [T]) -> Result<(), FftError> {
        if real.len() != imag.len() {
            return Ok(());
        }
        let mut packed = pack(real, imag);
        self.forward(&mut packed)?;
        unpack(&packed, real, imag);
        Ok(())
    }

    fn inverse_split(&self, real: &mut [T], imag: &mut [T]) -> Result<(), FftError> {
        if real.len() != imag.len() {
            return Ok(());
        }
        let mut packed = pack(real, imag);
        self.inverse(&mut packed)?;
        unpack(&packed, real, imag);
        Ok(())
    }
}

/// In-place radix-2 decimation-in-frequency FFT followed by a bit-reversal pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct IterativeFft;

impl<T: FftFloat> FourierTransform<T> for IterativeFft {
    fn forward(&self, data: &mut [Complex<T>]) -> Result<(), FftError> {
        let n = check_len(data.len())?;
        if n <= 1 {
            return Ok(());
        }

        let theta = T::PI() / T::from_usize(n).ok_or(FftError::Unrepresentable(n))?;
        // Squared once per stage: exp(-2πi/span) for the current span.
        let mut step = Complex::new(theta.cos(), -theta.sin());

        let mut half = n;
        while half > 1 {
            let span = half;
            half >>= 1;
            step = step * step;

            let mut twiddle = Complex::new(T::one(), T::zero());
            for offset in 0..half {
                let mut a = offset;
                while a < n {
                    let b = a + half;
                    let diff = data[a] - data[b];
                    data[a] = data[a] + data[b];
                    data[b] = diff * twiddle;
                    a += span;
                }
                twiddle = twiddle * step;
            }
        }

        bit_reverse_permute(data);
        Ok(())
    }
}

/// Recursive even/odd Cooley-Tukey transform. Slower and allocates per level;
/// kept to cross-check the iterative engine.
#[cfg(test)]
#[derive(Clone, Copy, Debug, Default)]
pub struct RecursiveFft;

#[cfg(test)]
impl<T: FftFloat> FourierTransform<T> for RecursiveFft {
    fn forward(&self, data: &mut [Complex<T>]) -> Result<(), FftError> {
        check_len(data.len())?;
        recursive_forward(data)
    }
}

#[cfg(test)]
fn recursive_forward<T: FftFloat>(data: &mut [Complex<T>]) -> Result<(), FftError> {
    let n = data.len();
    if n <= 1 {
        return Ok(());
    }

    let mut even: Vec<Complex<T>> = data.iter().step_by(2).copied().collect();
    let mut odd: Vec<Complex<T>> = data.iter().skip(1).step_by(2).copied().collect();
    recursive_forward(&mut even)?;
    recursive_forward(&mut odd)?;

    let len = T::from_usize(n).ok_or(FftError::Unrepresentable(n))?;
    let two_pi = T::PI() + T::PI();
    for k in 0..n / 2 {
        let index = T::from_usize(k).ok_or(FftError::Unrepresentable(n))?;
        let t = Complex::from_polar(T::one(), -two_pi * index / len) * odd[k];
        data[k] = even[k] + t;
        data[k + n / 2] = even[k] - t;
    }
    Ok(())
}

/// Per-bin magnitude `sqrt(re² + im²)`.
pub fn magnitudes<T: FftFloat>(spectrum: &[Complex<T>], out: &mut Vec<T>) {
    out.clear();
    out.extend(spectrum.iter().map(|c| c.norm()));
}

fn check_len(n: usize) -> Result<usize, FftError> {
    if n == 0 || n.is_power_of_two() {
        Ok(n)
    } else {
        Err(FftError::NotPowerOfTwo(n))
    }
}

fn conjugate<T: FftFloat>(data: &mut [Complex<T>]) {
    for c in data.iter_mut() {
        *c = c.conj();
    }
}

fn bit_reverse_permute<T>(data: &mut [T]) {
    let n = data.len();
    if n <= 2 {
        return;
    }
    let bits = n.trailing_zeros();
    for a in 0..n {
        let b = a.reverse_bits() >> (usize::BITS - bits);
        // Each pair is swapped once, from its lower index.
        if b > a {
            data.swap(a, b);
        }
    }
}

fn pack<T: FftFloat>(real: &[T], imag: &[T]) -> Vec<Complex<T>> {
    real.iter()
        .zip(imag.iter())
        .map(|(&re, &im)| Complex::new(re, im))
        .collect()
}

fn unpack<T: FftFloat>(packed: &[Complex<T>], real: &mut [T], imag: &mut [T]) {
    for ((c, re), im) in packed.iter().zip(real.iter_mut()).zip(imag.iter_mut()) {
        *re = c.re;
        *im = c.im;
    }
}

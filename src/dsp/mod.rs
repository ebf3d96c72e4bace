pub mod fft;
pub mod spectrum;

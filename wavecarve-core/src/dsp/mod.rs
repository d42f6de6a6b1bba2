pub mod frame;
pub mod quantize;
pub mod resample;

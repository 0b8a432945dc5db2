pub mod error;
pub mod consts;
pub mod exposure;
pub mod stats;
pub mod classify;
pub mod spectrum;
pub mod solve;
pub mod subtract;

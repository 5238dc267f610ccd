//! Per-tick processing
//!
//! Pure algorithms applied inside a sampling tick: frame downsampling and
//! held-key to action-vector encoding.

pub mod action;
pub mod downsample;

pub use action::{encode_action, ActionVector};
pub use downsample::resize_area;

//! Terminal output helpers
//!
//! Interactive terminals get glyphs and colors; pipes and CI get bracketed
//! tags so output stays grep-friendly.

mod context;
mod output;

pub use context::UiContext;
pub use output::{
    heading, key_value, key_value_status, remark, section, step_info, step_ok, step_ok_detail,
    step_warn, step_warn_hint,
};

//! dms_lib
//!
//! Martian stages for the DMS analysis step tools: a resources stage that
//! stages each tool's inputs, and a runner stage that launches the tool and
//! packages its results.
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

pub mod dta;
pub mod glyq_iq;
pub mod stages;
mod tool;

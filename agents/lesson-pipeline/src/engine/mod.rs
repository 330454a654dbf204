//! Deterministic pipeline stages
//!
//! Pure functions of their inputs: the same documents in always produce the
//! same documents out.

pub mod assembler;
pub mod slot_filler;
pub mod slot_mapper;
pub mod spec_diff;

pub use assembler::{assemble, derive_lesson_id, AssemblyInput};
pub use slot_filler::{fill_slots, placeholder};
pub use slot_mapper::map_slots;
pub use spec_diff::diff_specs;

//! Multi-scene assembly.
//!
//! Combines independently rendered scene clips, one voice track and an optional
//! music bed into a single video whose length equals the voice track exactly.
//! The picture always adapts to the voice: a short sequence is looped, a long
//! one is trimmed.

mod assembler;
mod plan;

pub use assembler::{
    AssembledVideo, AssemblyClip, AssemblyError, AssemblyRequest, MultiSceneAssembler,
};
pub use plan::{even_dimension, AssemblyPlan, AssemblySettings};

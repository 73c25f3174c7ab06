//! Data models for decoded bytecode and rendered heatmaps

pub mod instruction;
pub mod display;
pub mod render;

pub use self::instruction::{DecodedInstruction, InstructionCategory, RawInstruction, RegInfo, RegisterRole};
pub use self::display::DisplayRow;
pub use self::render::{RenderChunk, RenderPlan, RenderRequest};

//! Delegated tool boundary for xcode-repack
//!
//! The repackaging pipeline never decompresses, signs, edits plists or
//! patches Mach-O load commands itself. It builds an [`Invocation`] for the
//! external tool that does, and hands it to a [`ToolRunner`]:
//! - [`SystemRunner`]: spawns the real process and waits for it
//! - [`mock::ScriptedRunner`]: records invocations and emulates tools in tests
//!
//! [`ToolPaths`] knows where each tool lives and how it is called.

mod invocation;
pub mod mock;
mod runner;
mod tools;

pub use invocation::Invocation;
pub use runner::{SystemRunner, ToolError, ToolOutput, ToolRunner};
pub use tools::ToolPaths;

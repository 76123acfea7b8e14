//! Built-in tools for the NanoClaw agent.
//!
//! Each tool implements `nanoclaw_core::Tool` and returns a plain string
//! result. Recoverable problems (missing file, no transcript) come back as
//! `Ok` with an explanatory message so the model can react; real faults
//! (denied command, bad arguments) are `Err` and the loop feeds the error
//! text back as the call's result.

pub mod file_read;
pub mod file_write;
pub mod path;
pub mod shell;
pub mod youtube;

pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use shell::ShellTool;
pub use youtube::YoutubeTranscriptTool;

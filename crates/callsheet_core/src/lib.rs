pub mod assets;
pub mod autosave;
pub mod clock;
pub mod config;
pub mod editing;
pub mod error;
pub mod history;
pub mod import;
pub mod project;
pub mod recalc;
pub mod reorder;
pub mod session;
pub mod types;

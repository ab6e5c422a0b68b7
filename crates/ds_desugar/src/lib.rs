//! Tree-to-tree passes that turn an async Python module into its sync
//! counterpart.
//!
//! Passes, in pipeline order:
//! - [`blanks`]: mark blank lines so the output keeps the source layout
//! - [`desugar`]: `async def` / `async for` / `async with` / `await`
//! - [`rename`]: async identifiers → sync identifiers
//! - [`setters`]: `x.set_autocommit(v)` → `x.autocommit = v`

pub mod blanks;
pub mod config;
pub mod convert;
pub mod desugar;
pub mod rename;
pub mod setters;

pub use config::SyncConfig;
pub use convert::async_to_sync;

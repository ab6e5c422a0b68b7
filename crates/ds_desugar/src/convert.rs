//! Pipeline driver.

use ds_ast::{Module, VisitMutWith};

use crate::blanks::BlanksInserter;
use crate::config::SyncConfig;
use crate::desugar::AsyncToSync;
use crate::rename::RenameAsyncToSync;
use crate::setters::FixAsyncSetters;

/// Convert an async module into its sync counterpart.
///
/// Blank markers go in first, while every node still has its source
/// position; the other passes may replace nodes.
pub fn async_to_sync(mut module: Module, config: &SyncConfig) -> Module {
    module.visit_mut_with(&mut BlanksInserter);
    tracing::debug!("inserted blank markers");

    module.visit_mut_with(&mut AsyncToSync);
    tracing::debug!("desugared async constructs");

    module.visit_mut_with(&mut RenameAsyncToSync::new(config));
    tracing::debug!("renamed async identifiers");

    module.visit_mut_with(&mut FixAsyncSetters::new(&config.setters));
    tracing::debug!("rewrote async setters");

    module
}

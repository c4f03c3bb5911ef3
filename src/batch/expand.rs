//! Batch override expansion: one scene variant per batch key.

use crate::compile::diagnostics::Diagnostics;
use crate::compile::engine::{Compilation, CompileOptions, prepare, run};
use crate::foundation::error::{NodeflowError, NodeflowResult};
use crate::graph::index::GraphIndex;
use crate::resolve::overrides::Overrides;
use rayon::prelude::*;

/// Worker pool settings for batch expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker threads; `None` uses rayon's default.
    pub threads: Option<usize>,
}

/// One data-driven variant of the compiled graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneVariant {
    /// Batch key that was active.
    pub key: String,
    /// Compiled scene, or the diagnostics that stopped this variant.
    pub outcome: Result<Compilation, Diagnostics>,
}

/// The base compilation plus every keyed variant, sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchExpansion {
    /// Compilation with no batch key active.
    pub base: Compilation,
    /// One entry per distinct batch key.
    pub variants: Vec<SceneVariant>,
}

/// Failures that prevent expansion as a whole.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    /// The graph does not compile even without a batch key.
    #[error("base compilation failed:\n{0}")]
    Compile(#[from] Diagnostics),
    /// The worker pool could not be set up.
    #[error(transparent)]
    Setup(#[from] NodeflowError),
}

/// Compile the graph once per batch key in `overrides.batch`.
///
/// Graph validation and value evaluation run once; each variant only re-walks paths and
/// re-resolves properties with its key active, so object and track ids match across variants.
#[tracing::instrument(skip_all, fields(graph = %index.fingerprint()))]
pub fn expand_batch(
    index: &GraphIndex,
    overrides: &Overrides,
    options: &CompileOptions,
    batch: &BatchOptions,
) -> Result<BatchExpansion, BatchError> {
    let prepared = prepare(index, options)?;
    let base = run(index, &prepared, overrides, None)?;

    let keys: Vec<String> = overrides.batch.keys().into_iter().collect();
    tracing::debug!(variants = keys.len(), "expanding batch");
    if keys.is_empty() {
        return Ok(BatchExpansion {
            base,
            variants: Vec::new(),
        });
    }

    let pool = build_thread_pool(batch.threads)?;
    let variants = pool.install(|| {
        keys.par_iter()
            .map(|key| SceneVariant {
                key: key.clone(),
                outcome: run(index, &prepared, overrides, Some(key.as_str())),
            })
            .collect::<Vec<_>>()
    });
    Ok(BatchExpansion { base, variants })
}

fn build_thread_pool(threads: Option<usize>) -> NodeflowResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(NodeflowError::validation("batch 'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| NodeflowError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/batch/expand.rs"]
mod tests;

use anyhow::Context;
use rayon::ThreadPoolBuilder;

/// Build a bounded pool for hashing workers.
///
/// Each `list` run owns its pool so the worker count always matches the
/// configuration of that run.
///
/// # Errors
///
/// Returns an error if `num_threads` is zero or the pool cannot be built.
pub fn build_pool(num_threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    if num_threads == 0 {
        anyhow::bail!("Worker pool needs at least one thread");
    }

    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("treesum-worker-{i}"))
        .build()
        .context("Failed to build worker pool")
}

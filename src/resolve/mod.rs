// src/resolve/mod.rs
// =============================================================================
// Dependency resolution.
//
// Submodules:
// - visited: Which packages this run has already scheduled
// - mirror: Which download link to use for a package
// - resolver: The recursive walk over package pages
// =============================================================================

mod mirror;
mod resolver;
mod visited;

pub use resolver::Resolver;
pub use visited::VisitedSet;

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does resolve() return a BoxFuture?
//    - An async fn can't call itself directly: its future would contain
//      itself and have infinite size
//    - Boxing puts the inner future on the heap, so the size is known
//    - `.boxed()` from futures::FutureExt does the boxing for us
//
// 2. How does the walk avoid visiting a package twice?
//    - VisitedSet::try_claim checks and inserts under one lock
//    - Only the task that wins the claim goes on to fetch and enqueue
//    - That also stops cycles (a -> b -> a) from looping forever
//
// 3. Why a JoinSet per package?
//    - Each dependency is resolved in its own spawned task
//    - The parent waits for all of them before it counts as done, so when
//      the root's future finishes, the whole tree has been walked
// -----------------------------------------------------------------------------

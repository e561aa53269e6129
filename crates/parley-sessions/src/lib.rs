//! # parley-sessions
//!
//! Keeps live interview sessions in an explicit, lock-guarded registry and
//! bounds their number under memory pressure. Eviction is lossy: callers
//! must persist summaries and transcripts before a session becomes evictable.

mod store;
mod supervisor;

pub use store::{EvictionReport, SessionStore};
pub use supervisor::{MemoryProbe, ProcStatusProbe, ResourceSupervisor, SupervisorConfig};

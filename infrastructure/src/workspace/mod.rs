//! Git working-tree adapter.

mod git;

pub use git::{GitWorkspace, SOURCE_CACHE_FILE};

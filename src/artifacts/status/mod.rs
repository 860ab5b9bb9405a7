//! Working tree status inspection
//!
//! Compares the working tree against the staging area and the current branch's snapshot.

pub mod status_info;

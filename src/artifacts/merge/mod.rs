//! Three-way merge
//!
//! - `bca_finder`: best common ancestor of two branch tips
//! - `three_way`: per-path comparison of base, ours and theirs snapshots
//! - `conflict`: conflict markers and their resolution
//! - `merge_result`: outcome reported to the caller

pub mod bca_finder;
pub mod conflict;
pub mod merge_result;
pub mod three_way;

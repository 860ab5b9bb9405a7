//! Working tree migrations
//!
//! Switching the working tree from one snapshot to another (checkout, merge) is planned as
//! a [`Migration`](migration::Migration): files to add, modify and delete. The plan is checked
//! against local modifications before any file is touched.

pub mod migration;

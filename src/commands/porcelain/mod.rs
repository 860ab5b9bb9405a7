//! Porcelain commands
//!
//! - `init`: create a repository
//! - `add`: stage files
//! - `commit`: record the staged snapshot
//! - `status`: classify working tree files
//! - `log`: first-parent history
//! - `branch`: create, list or delete branches
//! - `checkout`: switch branches
//! - `merge`: three-way merge of another branch
//! - `resolve`: collapse conflict markers, list conflicted files
//! - `remote`: manage remotes
//! - `push`: hand the current branch to a transport

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod merge;
pub mod push;
pub mod remote;
pub mod resolve;
pub mod status;

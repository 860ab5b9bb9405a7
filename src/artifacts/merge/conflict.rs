//! Conflict markers
//!
//! A conflicting path is rewritten as
//!
//! ```text
//! <<<<<<< HEAD (<current branch>)
//! <our content>
//! =======
//! <their content>
//! >>>>>>> <source branch>
//! ```
//!
//! A side that does not end with a newline gets one, followed by the line
//! `\ No newline at end of file`, so that resolving the block restores its exact bytes.
//!
//! Resolution works line by line on raw bytes, so content that is not valid UTF-8 passes
//! through untouched.

use crate::errors::CitError;
use std::str::FromStr;

pub const OURS_MARKER: &[u8] = b"<<<<<<<";
pub const SEPARATOR_MARKER: &[u8] = b"=======";
pub const THEIRS_MARKER: &[u8] = b">>>>>>>";
pub const NO_NEWLINE_MARKER: &[u8] = b"\\ No newline at end of file";

/// How to collapse a conflict block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Keep the current branch's side
    Ours,
    /// Keep the merged branch's side
    Theirs,
    /// Keep both sides, ours first
    Both,
}

impl FromStr for ResolutionStrategy {
    type Err = CitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ours" => Ok(ResolutionStrategy::Ours),
            "theirs" => Ok(ResolutionStrategy::Theirs),
            "both" => Ok(ResolutionStrategy::Both),
            _ => Err(CitError::UnsupportedStrategy(value.to_string())),
        }
    }
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResolutionStrategy::Ours => "ours",
            ResolutionStrategy::Theirs => "theirs",
            ResolutionStrategy::Both => "both",
        };
        write!(f, "{name}")
    }
}

/// Content of a conflicting file; an absent side is empty
pub fn conflict_markers(
    current_branch: &str,
    ours: &[u8],
    source_branch: &str,
    theirs: &[u8],
) -> Vec<u8> {
    let mut content = Vec::with_capacity(ours.len() + theirs.len() + 64);

    content.extend_from_slice(OURS_MARKER);
    content.extend_from_slice(format!(" HEAD ({current_branch})\n").as_bytes());
    push_terminated(&mut content, ours);
    content.extend_from_slice(SEPARATOR_MARKER);
    content.push(b'\n');
    push_terminated(&mut content, theirs);
    content.extend_from_slice(THEIRS_MARKER);
    content.extend_from_slice(format!(" {source_branch}\n").as_bytes());

    content
}

fn push_terminated(content: &mut Vec<u8>, side: &[u8]) {
    content.extend_from_slice(side);
    if !side.is_empty() && !side.ends_with(b"\n") {
        content.push(b'\n');
        content.extend_from_slice(NO_NEWLINE_MARKER);
        content.push(b'\n');
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Ours,
    Theirs,
}

/// Collapse every conflict block of `content` according to `strategy`
///
/// Text outside conflict blocks is preserved as is.
pub fn resolve(content: &[u8], strategy: ResolutionStrategy) -> Vec<u8> {
    let mut resolved = Vec::with_capacity(content.len());
    let mut section = Section::Outside;

    for line in content.split_inclusive(|byte| *byte == b'\n') {
        section = match section {
            Section::Outside if line.starts_with(OURS_MARKER) => Section::Ours,
            Section::Ours if line.starts_with(SEPARATOR_MARKER) => Section::Theirs,
            Section::Theirs if line.starts_with(THEIRS_MARKER) => Section::Outside,
            Section::Ours | Section::Theirs if line.trim_ascii_end() == NO_NEWLINE_MARKER => {
                // ours keeps its line break when theirs follows it
                let keeps_newline = section == Section::Ours && strategy == ResolutionStrategy::Both;
                if is_kept(section, strategy) && !keeps_newline && resolved.ends_with(b"\n") {
                    resolved.pop();
                }
                section
            }
            _ => {
                if is_kept(section, strategy) {
                    resolved.extend_from_slice(line);
                }
                section
            }
        };
    }

    resolved
}

fn is_kept(section: Section, strategy: ResolutionStrategy) -> bool {
    !matches!(
        (section, strategy),
        (Section::Ours, ResolutionStrategy::Theirs) | (Section::Theirs, ResolutionStrategy::Ours)
    )
}

/// Whether any line starts with a conflict marker
pub fn has_conflict_markers(content: &[u8]) -> bool {
    content.split(|byte| *byte == b'\n').any(|line| {
        line.starts_with(OURS_MARKER)
            || line.starts_with(SEPARATOR_MARKER)
            || line.starts_with(THEIRS_MARKER)
    })
}

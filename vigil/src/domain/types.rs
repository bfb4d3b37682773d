//! Core domain newtypes.

use std::fmt;

/// Operating-system process identifier.
///
/// Unique within a single snapshot; the OS may reuse a pid after the process
/// exits, so a pid alone never proves identity across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub i32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

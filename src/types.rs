/// A group index is u16.
/// CaptureGroupID 1 corresponds to the first capture group; 0 is never
/// assigned.
pub type CaptureGroupID = u16;

/// The maximum number of capture groups supported.
pub const MAX_CAPTURE_GROUPS: usize = 65535;

/// An index into the instruction arena of a compiled program.
pub type JumpTarget = u32;

/// An instruction pointer, as used by the executors.
pub type IP = usize;

/// Identifies a star or plus loop within a compiled program.
pub type LoopID = u32;

/// Where the current iteration of a loop began, or None if the loop has not
/// started an iteration from its loop-back point.
pub type LoopData = Option<usize>;

/// A capture slot. Group N records its start in slot 2N and its end in slot
/// 2N + 1.
pub type Slot = u32;

/// \return the pair of slots recording the boundaries of \p group.
#[inline]
pub fn slots_for_group(group: CaptureGroupID) -> (Slot, Slot) {
    let base = (group as Slot) << 1;
    (base, base | 1)
}

/// Budgets bounding the work done on behalf of a pattern.
/// These protect against hostile patterns; the defaults are generous enough
/// that ordinary patterns never approach them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth of the parsed tree.
    pub max_nesting: usize,

    /// Maximum number of instructions in a compiled program.
    pub max_insns: usize,

    /// Maximum number of instructions executed during one anchored match
    /// attempt.
    pub max_steps: usize,

    /// Maximum number of pending backtrack entries.
    pub max_backtrack: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_nesting: 256,
            max_insns: 1 << 20,
            max_steps: 10_000_000,
            max_backtrack: 1 << 20,
        }
    }
}

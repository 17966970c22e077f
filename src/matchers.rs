use crate::api::Flags;
use crate::insn::AssertionKind;

/// \return whether \p b ends a line.
#[inline(always)]
pub fn is_line_terminator(b: u8) -> bool {
    b == b'\n'
}

/// \return whether the assertion \p kind holds at \p pos within \p text.
/// Line and text anchors are only tested if \p flags asks for it; word
/// boundaries are never tested.
#[inline]
pub fn assertion_holds(kind: AssertionKind, flags: Flags, text: &[u8], pos: usize) -> bool {
    if flags.no_anchor_checks {
        return true;
    }
    match kind {
        AssertionKind::StartOfLine => {
            pos == 0 || text.get(pos - 1).copied().is_some_and(is_line_terminator)
        }
        AssertionKind::EndOfLine => text.get(pos).copied().map_or(true, is_line_terminator),
        AssertionKind::StartOfText => pos == 0,
        AssertionKind::EndOfText => pos >= text.len(),
        AssertionKind::WordBoundary | AssertionKind::NotWordBoundary | AssertionKind::Empty => {
            true
        }
    }
}

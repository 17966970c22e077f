//! Regex compiler back-end: transforms IR into a CompiledRegex
//!
//! Each node is lowered to a fragment: an entry instruction plus the list of
//! outgoing edges still waiting for a successor. Fragments are joined by
//! patching those edges once the successor is known.

use crate::error::Error;
use crate::insn::{AssertionKind, BracketContents, CompiledRegex, Edge, Insn, UNPATCHED};
use crate::ir;
use crate::ir::{Node, Quantifier};
use crate::startpredicate;
use crate::types::{slots_for_group, JumpTarget, Limits, LoopID};
use log::debug;

/// Edges awaiting a target, as (instruction, edge) pairs.
type PatchList = Vec<(JumpTarget, Edge)>;

/// A partially compiled node.
#[derive(Debug)]
struct Fragment {
    entry: JumpTarget,
    out: PatchList,
}

/// \return an assertion kind for a given IR anchor.
fn make_anchor(anchor_type: ir::AnchorType) -> AssertionKind {
    match anchor_type {
        ir::AnchorType::StartOfLine => AssertionKind::StartOfLine,
        ir::AnchorType::EndOfLine => AssertionKind::EndOfLine,
        ir::AnchorType::StartOfText => AssertionKind::StartOfText,
        ir::AnchorType::EndOfText => AssertionKind::EndOfText,
    }
}

/// Type which wraps up the context needed to emit a CompiledRegex.
struct Emitter {
    insns: Vec<Insn>,
    brackets: Vec<BracketContents>,
    loops: LoopID,
    max_insns: usize,
}

impl Emitter {
    /// Emit an instruction.
    /// Return the instruction's index.
    fn emit_insn(&mut self, insn: Insn) -> Result<JumpTarget, Error> {
        let idx = self.insns.len();
        // UNPATCHED is reserved, so the arena may never reach it.
        if idx >= self.max_insns || idx >= UNPATCHED as usize {
            return Err(Error::ProgramTooLarge(self.max_insns));
        }
        self.insns.try_reserve(1)?;
        self.insns.push(insn);
        Ok(idx as JumpTarget)
    }

    /// Emit an instruction with a single open edge.
    fn emit_single(&mut self, insn: Insn) -> Result<Fragment, Error> {
        let entry = self.emit_insn(insn)?;
        Ok(Fragment {
            entry,
            out: vec![(entry, Edge::First)],
        })
    }

    /// Point every edge in \p list at \p target. This consumes the list.
    fn patch(&mut self, list: PatchList, target: JumpTarget) {
        for (idx, edge) in list {
            if let Some(slot) = self
                .insns
                .get_mut(idx as usize)
                .and_then(|insn| insn.edge_mut(edge))
            {
                debug_assert!(*slot == UNPATCHED, "Edge patched twice");
                *slot = target;
            }
        }
    }

    /// Append \p next to \p running, if any.
    /// \return the combined fragment.
    fn concat(&mut self, running: Option<Fragment>, next: Fragment) -> Fragment {
        match running {
            None => next,
            Some(mut frag) => {
                let out = std::mem::replace(&mut frag.out, next.out);
                self.patch(out, next.entry);
                frag
            }
        }
    }

    /// Wrap \p frag in an optional split whose secondary edge bypasses it.
    fn make_optional(&mut self, mut frag: Fragment) -> Result<Fragment, Error> {
        let split = self.emit_insn(Insn::Split {
            primary: frag.entry,
            secondary: UNPATCHED,
        })?;
        frag.out.push((split, Edge::Second));
        Ok(Fragment {
            entry: split,
            out: frag.out,
        })
    }

    /// Emit a star or plus loop around \p loopee.
    /// A star tests its exit before the first iteration; a plus runs the body
    /// once before reaching the loop-back point.
    fn emit_loop(&mut self, loopee: Node, at_least_once: bool) -> Result<Fragment, Error> {
        let id = self.loops;
        self.loops = self.loops.checked_add(1).ok_or(Error::ProgramTooLarge(self.max_insns))?;
        let enter = self.emit_insn(Insn::EnterLoop {
            id,
            next: UNPATCHED,
        })?;
        let body = self.emit_node(loopee)?;
        let again = self.emit_insn(Insn::LoopAgain {
            id,
            body: body.entry,
            exit: UNPATCHED,
        })?;
        self.patch(body.out, again);
        let first = if at_least_once { body.entry } else { again };
        self.patch(vec![(enter, Edge::First)], first);
        Ok(Fragment {
            entry: enter,
            out: vec![(again, Edge::Second)],
        })
    }

    /// Emit `min` mandatory copies of \p loopee followed by `max - min`
    /// optional copies. Each copy is lowered independently.
    fn emit_range(&mut self, loopee: Node, min: u32, max: u32) -> Result<Fragment, Error> {
        let total = u64::from(min.max(max));
        if total == 0 {
            return self.emit_single(Insn::Assertion {
                kind: AssertionKind::Empty,
                next: UNPATCHED,
            });
        }
        let mut loopee = Some(loopee);
        let mut result: Option<Fragment> = None;
        for copy in 0..total {
            // The last copy takes the node itself.
            let node = if copy + 1 == total {
                loopee.take()
            } else {
                loopee.clone()
            };
            let mut frag = self.emit_node(node.ok_or(Error::EmptyNode("repeat"))?)?;
            if copy >= u64::from(min) {
                frag = self.make_optional(frag)?;
            }
            result = Some(self.concat(result, frag));
        }
        result.ok_or(Error::EmptyNode("repeat"))
    }

    /// Emit instructions corresponding to a given node, consuming it.
    fn emit_node(&mut self, node: Node) -> Result<Fragment, Error> {
        match node {
            Node::Empty => self.emit_single(Insn::Assertion {
                kind: AssertionKind::Empty,
                next: UNPATCHED,
            }),
            Node::Anchor(anchor_type) => self.emit_single(Insn::Assertion {
                kind: make_anchor(anchor_type),
                next: UNPATCHED,
            }),
            Node::WordBoundary { invert } => {
                let kind = if invert {
                    AssertionKind::NotWordBoundary
                } else {
                    AssertionKind::WordBoundary
                };
                self.emit_single(Insn::Assertion {
                    kind,
                    next: UNPATCHED,
                })
            }
            Node::MatchAny => self.emit_single(Insn::MatchAny { next: UNPATCHED }),
            Node::ByteSequence(bytes) => {
                let mut result: Option<Fragment> = None;
                for &c in bytes.iter() {
                    let frag = self.emit_single(Insn::Char { c, next: UNPATCHED })?;
                    result = Some(self.concat(result, frag));
                }
                result.ok_or(Error::EmptyNode("literal"))
            }
            Node::Bracket(members) => {
                let idx = self.brackets.len() as u32;
                self.brackets.try_reserve(1)?;
                self.brackets.push(BracketContents::from_members(&members)?);
                self.emit_single(Insn::Bracket {
                    idx,
                    next: UNPATCHED,
                })
            }
            Node::Cat(children) => {
                let mut result: Option<Fragment> = None;
                for child in children {
                    let frag = self.emit_node(child)?;
                    result = Some(self.concat(result, frag));
                }
                result.ok_or(Error::EmptyNode("concatenation"))
            }
            Node::Alt(children) => {
                // Each new arm becomes the secondary edge of a split whose
                // primary edge is everything before it.
                let mut result: Option<Fragment> = None;
                for child in children {
                    let frag = self.emit_node(child)?;
                    result = Some(match result {
                        None => frag,
                        Some(mut running) => {
                            let split = self.emit_insn(Insn::Split {
                                primary: running.entry,
                                secondary: frag.entry,
                            })?;
                            running.entry = split;
                            running.out.extend(frag.out);
                            running
                        }
                    });
                }
                result.ok_or(Error::EmptyNode("alternation"))
            }
            Node::Loop { loopee, quant } => match quant {
                Quantifier::Star => self.emit_loop(*loopee, false),
                Quantifier::Plus => self.emit_loop(*loopee, true),
                Quantifier::Quest => {
                    let frag = self.emit_node(*loopee)?;
                    self.make_optional(frag)
                }
                Quantifier::Range { min, max } => self.emit_range(*loopee, min, max),
            },
            Node::CaptureGroup(contents, group) => {
                let (open_slot, close_slot) = slots_for_group(group);
                let open = self.emit_insn(Insn::CaptureBoundary {
                    slot: open_slot,
                    next: UNPATCHED,
                })?;
                let frag = self.emit_node(*contents)?;
                self.patch(vec![(open, Edge::First)], frag.entry);
                let close = self.emit_insn(Insn::CaptureBoundary {
                    slot: close_slot,
                    next: UNPATCHED,
                })?;
                self.patch(frag.out, close);
                Ok(Fragment {
                    entry: open,
                    out: vec![(close, Edge::First)],
                })
            }
        }
    }
}

/// Compile the given IR to a CompiledRegex, consuming the IR.
pub fn emit(re: ir::Regex, limits: &Limits) -> Result<CompiledRegex, Error> {
    let start_pred = startpredicate::predicate_for_re(&re);
    let ir::Regex {
        node,
        flags,
        groups,
    } = re;
    let mut emitter = Emitter {
        insns: Vec::new(),
        brackets: Vec::new(),
        loops: 0,
        max_insns: limits.max_insns,
    };
    let frag = emitter.emit_node(node)?;
    let goal = emitter.emit_insn(Insn::Goal)?;
    emitter.patch(frag.out, goal);
    debug!(
        "emitted {} instructions, {} brackets, {} groups, {} loops, start predicate {:?}",
        emitter.insns.len(),
        emitter.brackets.len(),
        groups,
        emitter.loops,
        start_pred
    );
    Ok(CompiledRegex {
        insns: emitter.insns,
        brackets: emitter.brackets,
        start: frag.entry,
        groups,
        loops: emitter.loops,
        start_pred,
        flags,
        limits: *limits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Flags;
    use crate::buffer::ByteBuf;
    use crate::parse::try_parse;
    use crate::types::Slot;

    fn compile(pattern: &str) -> CompiledRegex {
        let limits = Limits::default();
        let re = try_parse(pattern.as_bytes(), Flags::default(), &limits).unwrap();
        emit(re, &limits).unwrap()
    }

    fn compile_node(node: Node) -> Result<CompiledRegex, Error> {
        let re = ir::Regex {
            node,
            flags: Flags::default(),
            groups: 0,
        };
        emit(re, &Limits::default())
    }

    /// Walk the program from its entry, following only first edges, and
    /// collect the capture slots seen.
    fn capture_slots_along_first_edges(cr: &CompiledRegex) -> Vec<Slot> {
        let mut slots = Vec::new();
        let mut ip = cr.start;
        for _ in 0..cr.insns.len() {
            match cr.insns[ip as usize] {
                Insn::Goal => break,
                Insn::CaptureBoundary { slot, next } => {
                    slots.push(slot);
                    ip = next;
                }
                Insn::MatchAny { next }
                | Insn::Char { next, .. }
                | Insn::Bracket { next, .. }
                | Insn::Assertion { next, .. }
                | Insn::EnterLoop { next, .. } => ip = next,
                Insn::Split { primary, .. } => ip = primary,
                Insn::LoopAgain { body, .. } => ip = body,
            }
        }
        slots
    }

    fn assert_fully_patched(cr: &CompiledRegex) {
        for insn in &cr.insns {
            for target in insn.successors() {
                assert_ne!(target, UNPATCHED, "unpatched edge in {:?}", cr);
                assert!((target as usize) < cr.insns.len());
            }
        }
    }

    #[test]
    fn test_literal_is_char_chain() {
        let cr = compile("ab");
        assert_eq!(cr.insns.len(), 3);
        assert!(matches!(cr.insns[cr.start as usize], Insn::Char { c: b'a', next: 1 }));
        assert!(matches!(cr.insns[1], Insn::Char { c: b'b', next: 2 }));
        assert!(matches!(cr.insns[2], Insn::Goal));
    }

    #[test]
    fn test_star_loops_back() {
        let cr = compile("a*");
        // EnterLoop, Char, LoopAgain, Goal.
        assert_eq!(cr.insns.len(), 4);
        assert_eq!(cr.start, 0);
        assert_eq!(cr.loops, 1);
        assert!(matches!(cr.insns[0], Insn::EnterLoop { id: 0, next: 2 }));
        assert!(matches!(cr.insns[1], Insn::Char { c: b'a', next: 2 }));
        assert!(matches!(
            cr.insns[2],
            Insn::LoopAgain {
                id: 0,
                body: 1,
                exit: 3
            }
        ));
    }

    #[test]
    fn test_plus_enters_body() {
        let cr = compile("a+");
        assert_eq!(cr.start, 0);
        assert!(matches!(cr.insns[0], Insn::EnterLoop { id: 0, next: 1 }));
        assert!(matches!(cr.insns[1], Insn::Char { c: b'a', next: 2 }));
        assert!(matches!(
            cr.insns[2],
            Insn::LoopAgain {
                id: 0,
                body: 1,
                exit: 3
            }
        ));
    }

    #[test]
    fn test_loops_are_numbered() {
        let cr = compile("(a*b+)*c?");
        assert_eq!(cr.loops, 3);
        let mut ids: Vec<_> = cr
            .insns
            .iter()
            .filter_map(|insn| match insn {
                Insn::LoopAgain { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_fully_patched(&cr);
    }

    #[test]
    fn test_alternation_split_order() {
        let cr = compile("a|b");
        assert!(matches!(
            cr.insns[cr.start as usize],
            Insn::Split {
                primary: 0,
                secondary: 1
            }
        ));
        assert_fully_patched(&cr);
    }

    #[test]
    fn test_capture_slots_nest() {
        let cr = compile("(a(b))");
        assert_eq!(cr.groups, 2);
        assert_eq!(capture_slots_along_first_edges(&cr), vec![2, 4, 5, 3]);
    }

    #[test]
    fn test_range_copies() {
        // Two mandatory copies and one optional copy.
        let cr = compile("a{2,3}");
        let chars = cr
            .insns
            .iter()
            .filter(|insn| matches!(insn, Insn::Char { .. }))
            .count();
        let splits = cr
            .insns
            .iter()
            .filter(|insn| matches!(insn, Insn::Split { .. }))
            .count();
        assert_eq!((chars, splits), (3, 1));
        assert_fully_patched(&cr);

        // max below min keeps the mandatory copies only.
        let cr = compile("a{3,1}");
        assert_eq!(cr.insns.len(), 4);
        assert_fully_patched(&cr);
    }

    #[test]
    fn test_empty_range() {
        let cr = compile("a{0,0}");
        assert_eq!(cr.insns.len(), 2);
        assert!(matches!(
            cr.insns[cr.start as usize],
            Insn::Assertion {
                kind: AssertionKind::Empty,
                next: 1
            }
        ));
    }

    #[test]
    fn test_every_edge_patched() {
        for pattern in &[
            "",
            "a|b|c",
            "(a|b)*c",
            "x(y+)?z{1,3}",
            "^a.[bc]$",
            "\\Aa\\b\\B\\z",
            "((a*)*)+",
            "a{1,2}{2,3}",
            "|",
        ] {
            assert_fully_patched(&compile(pattern));
        }
    }

    #[test]
    fn test_empty_nodes_rejected() {
        assert_eq!(
            compile_node(Node::Cat(vec![])).map(|_| ()),
            Err(Error::EmptyNode("concatenation"))
        );
        assert_eq!(
            compile_node(Node::Alt(vec![])).map(|_| ()),
            Err(Error::EmptyNode("alternation"))
        );
        assert_eq!(
            compile_node(Node::ByteSequence(ByteBuf::new())).map(|_| ()),
            Err(Error::EmptyNode("literal"))
        );
    }

    #[test]
    fn test_program_budget() {
        let limits = Limits {
            max_insns: 10,
            ..Limits::default()
        };
        let re = try_parse(b"a{20,20}", Flags::default(), &limits).unwrap();
        assert_eq!(emit(re, &limits).map(|_| ()), Err(Error::ProgramTooLarge(10)));

        let re = try_parse(b"a{9,9}", Flags::default(), &limits).unwrap();
        assert!(emit(re, &limits).is_ok());
    }
}

//! PikeVM regex execution engine

use crate::error::Error;
use crate::exec;
use crate::insn::{CompiledRegex, Insn};
use crate::matchers;
use crate::types::IP;
use crate::util::DebugCheckIndex;

/// A priority-ordered list of threads, each identified by its IP.
/// Every thread in a list sits at the same position.
#[derive(Debug, Default)]
struct ThreadList {
    ips: Vec<IP>,
}

impl ThreadList {
    fn with_capacity(cap: usize) -> Result<Self, Error> {
        let mut ips = Vec::new();
        ips.try_reserve_exact(cap)?;
        Ok(ThreadList { ips })
    }
}

/// What happens to a thread when it executes its consuming instruction.
enum StateMatch {
    /// The thread dies.
    Fail,

    /// The thread consumed a byte and continues at the given IP.
    Advance(IP),

    /// The thread reached the goal.
    Complete,
}

/// Execute the consuming instruction at \p ip against the byte at \p pos.
/// Threads only ever rest at consuming instructions or Goal.
fn try_match_state(re: &CompiledRegex, text: &[u8], ip: IP, pos: usize) -> StateMatch {
    macro_rules! advance_or_fail {
        ($e:expr, $next:expr) => {
            if $e {
                StateMatch::Advance($next as IP)
            } else {
                StateMatch::Fail
            }
        };
    }
    let byte = text.get(pos).copied();
    match *re.insns.iat(ip) {
        Insn::Goal => StateMatch::Complete,
        Insn::MatchAny { next } => advance_or_fail!(byte.is_some(), next),
        Insn::Char { c, next } => advance_or_fail!(byte == Some(c), next),
        Insn::Bracket { idx, next } => {
            let bc = re.brackets.iat(idx as usize);
            advance_or_fail!(byte.is_some_and(|b| bc.contains(b)), next)
        }
        Insn::Assertion { .. }
        | Insn::CaptureBoundary { .. }
        | Insn::Split { .. }
        | Insn::EnterLoop { .. }
        | Insn::LoopAgain { .. } => {
            rs_unreachable!("Zero-width instructions are resolved while adding threads")
        }
    }
}

#[derive(Debug)]
struct MatchAttempter<'a> {
    re: &'a CompiledRegex,

    // Threads at the current position, and at the next one.
    clist: ThreadList,
    nlist: ThreadList,

    // IPs waiting to be followed while computing a closure.
    stack: Vec<IP>,

    // marks[ip] == generation iff ip was already reached at this position.
    marks: Vec<usize>,
    generation: usize,
}

impl<'a> MatchAttempter<'a> {
    fn new(re: &'a CompiledRegex) -> Self {
        Self {
            re,
            clist: ThreadList::default(),
            nlist: ThreadList::default(),
            stack: Vec::new(),
            marks: Vec::new(),
            generation: 0,
        }
    }

    /// Size our lists for the program, on first use.
    fn prepare(&mut self) -> Result<(), Error> {
        let count = self.re.insns.len();
        if self.marks.len() == count {
            return Ok(());
        }
        self.clist = ThreadList::with_capacity(count)?;
        self.nlist = ThreadList::with_capacity(count)?;
        self.stack.try_reserve_exact(2 * count + 1)?;
        self.marks.try_reserve_exact(count)?;
        self.marks.resize(count, 0);
        Ok(())
    }

    /// Start a fresh position: nothing has been reached yet.
    fn next_generation(&mut self) {
        self.generation += 1;
    }

    /// Add a thread at \p ip to \p list, following every zero-width edge
    /// reachable from it at \p pos. Threads are appended in the order the
    /// backtracker would visit them: a split's secondary edge comes first.
    fn add_thread(&mut self, text: &[u8], into_next: bool, ip: IP, pos: usize) -> Result<(), Error> {
        let re = self.re;
        self.stack.clear();
        self.stack.try_reserve(1)?;
        self.stack.push(ip);
        while let Some(ip) = self.stack.pop() {
            let mark = self.marks.mat(ip);
            if *mark == self.generation {
                continue;
            }
            *mark = self.generation;
            match *re.insns.iat(ip) {
                Insn::Split { primary, secondary }
                | Insn::LoopAgain {
                    body: primary,
                    exit: secondary,
                    ..
                } => {
                    // A loop which comes back around without consuming finds
                    // its LoopAgain already marked, so empty iterations end.
                    self.stack.try_reserve(2)?;
                    self.stack.push(primary as IP);
                    self.stack.push(secondary as IP);
                }
                Insn::Assertion { kind, next } => {
                    if matchers::assertion_holds(kind, re.flags, text, pos) {
                        self.stack.try_reserve(1)?;
                        self.stack.push(next as IP);
                    }
                }
                Insn::CaptureBoundary { next, .. } | Insn::EnterLoop { next, .. } => {
                    self.stack.try_reserve(1)?;
                    self.stack.push(next as IP);
                }
                Insn::Goal
                | Insn::MatchAny { .. }
                | Insn::Char { .. }
                | Insn::Bracket { .. } => {
                    let list = if into_next {
                        &mut self.nlist
                    } else {
                        &mut self.clist
                    };
                    list.ips.try_reserve(1)?;
                    list.ips.push(ip);
                }
            }
        }
        Ok(())
    }

    /// Run all threads in lockstep from \p start.
    /// \return the end of the highest-priority successful path.
    fn try_at_pos(&mut self, text: &[u8], start: usize) -> Result<Option<usize>, Error> {
        let re = self.re;
        self.prepare()?;
        self.clist.ips.clear();
        self.nlist.ips.clear();
        self.next_generation();
        self.add_thread(text, false, re.start as IP, start)?;

        let mut matched = None;
        let mut pos = start;
        while !self.clist.ips.is_empty() {
            self.next_generation();
            for idx in 0..self.clist.ips.len() {
                let ip = *self.clist.ips.iat(idx);
                match try_match_state(re, text, ip, pos) {
                    StateMatch::Fail => {}
                    StateMatch::Advance(next) => self.add_thread(text, true, next, pos + 1)?,
                    StateMatch::Complete => {
                        // Lower priority threads can no longer win.
                        matched = Some(pos);
                        break;
                    }
                }
            }
            core::mem::swap(&mut self.clist, &mut self.nlist);
            self.nlist.ips.clear();
            pos += 1;
        }
        Ok(matched)
    }
}

#[derive(Debug)]
pub struct PikeVMExecutor<'r, 't> {
    text: &'t [u8],
    re: &'r CompiledRegex,
    matcher: MatchAttempter<'r>,
}

impl exec::MatchProducer for PikeVMExecutor<'_, '_> {
    fn subject(&self) -> &[u8] {
        self.text
    }

    fn compiled(&self) -> &CompiledRegex {
        self.re
    }

    fn match_at(&mut self, pos: usize) -> Result<Option<usize>, Error> {
        self.matcher.try_at_pos(self.text, pos)
    }
}

impl<'r, 't> exec::Executor<'r, 't> for PikeVMExecutor<'r, 't> {
    fn new(re: &'r CompiledRegex, text: &'t [u8]) -> Self {
        Self {
            text,
            re,
            matcher: MatchAttempter::new(re),
        }
    }
}

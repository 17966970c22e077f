//! Classical backtracking execution engine

use crate::error::Error;
use crate::exec;
use crate::insn::{CompiledRegex, Insn};
use crate::matchers;
use crate::types::{LoopData, LoopID, IP};
use crate::util::DebugCheckIndex;
use log::trace;

#[derive(Copy, Clone, Debug)]
enum BacktrackInsn {
    /// Nothing more to backtrack.
    /// This "backstops" our stack.
    Exhausted,

    /// Restore the IP and position.
    SetPosition { ip: IP, pos: usize },

    /// Restore the data of a loop, then keep backtracking.
    SetLoopData { id: LoopID, data: LoopData },

    /// Begin a new iteration of a loop at the given body and position.
    EnterLoopBody { id: LoopID, ip: IP, pos: usize },
}

/// A set of (instruction, position) pairs already explored.
/// A pair explored by a failed attempt can never lead to a match, so it stays
/// set for later attempts on the same subject. Pairs set during a successful
/// attempt are forgotten.
#[derive(Debug, Default)]
struct VisitedSet {
    bits: Vec<u64>,
    stride: usize,

    // Indexes set during the current attempt.
    attempt: Vec<usize>,
}

impl VisitedSet {
    fn new(insn_count: usize, text_len: usize) -> Result<Self, Error> {
        let stride = text_len.checked_add(1).ok_or(Error::ResourceExhausted)?;
        let total = insn_count
            .checked_mul(stride)
            .ok_or(Error::ResourceExhausted)?;
        let words = (total + 63) / 64;
        let mut bits = Vec::new();
        bits.try_reserve_exact(words)?;
        bits.resize(words, 0);
        Ok(VisitedSet {
            bits,
            stride,
            attempt: Vec::new(),
        })
    }

    /// Mark (ip, pos) as visited.
    /// \return true if it was already visited.
    #[inline(always)]
    fn test_and_set(&mut self, ip: IP, pos: usize) -> Result<bool, Error> {
        let idx = ip * self.stride + pos;
        let word = self.bits.mat(idx / 64);
        let mask = 1u64 << (idx % 64);
        if *word & mask != 0 {
            return Ok(true);
        }
        *word |= mask;
        self.attempt.try_reserve(1)?;
        self.attempt.push(idx);
        Ok(false)
    }

    /// Forget the pairs set during the current attempt.
    fn forget_attempt(&mut self) {
        for idx in self.attempt.drain(..) {
            *self.bits.mat(idx / 64) &= !(1u64 << (idx % 64));
        }
    }
}

#[derive(Debug)]
pub(crate) struct MatchAttempter<'a> {
    re: &'a CompiledRegex,
    bts: Vec<BacktrackInsn>,
    loops: Vec<LoopData>,
    visited: Option<VisitedSet>,
}

impl<'a> MatchAttempter<'a> {
    pub(crate) fn new(re: &'a CompiledRegex) -> Self {
        Self {
            re,
            bts: vec![BacktrackInsn::Exhausted],
            loops: Vec::new(),
            visited: None,
        }
    }

    #[inline(always)]
    fn push_backtrack(&mut self, bt: BacktrackInsn) -> Result<(), Error> {
        // The backstop does not count against the budget.
        if self.bts.len() > self.re.limits.max_backtrack {
            return Err(Error::BacktrackLimitExceeded(self.re.limits.max_backtrack));
        }
        self.bts.try_reserve(1)?;
        self.bts.push(bt);
        Ok(())
    }

    /// Save the data of loop \p id so that backtracking restores it.
    /// If the top entry already restores this loop, nothing can resume in
    /// between, so that older value is the one that matters.
    #[inline(always)]
    fn save_loop_data(&mut self, id: LoopID) -> Result<(), Error> {
        if let Some(&BacktrackInsn::SetLoopData { id: top, .. }) = self.bts.last() {
            if top == id {
                return Ok(());
            }
        }
        let data = *self.loops.iat(id as usize);
        self.push_backtrack(BacktrackInsn::SetLoopData { id, data })
    }

    /// Attempt to backtrack.
    /// \return true if we backtracked, false if we exhaust the backtrack stack.
    fn try_backtrack(&mut self, ip: &mut IP, pos: &mut usize) -> bool {
        loop {
            // We always have a single Exhausted instruction backstopping our stack,
            // so we never pop it.
            debug_assert!(!self.bts.is_empty(), "Backtrack stack should not be empty");
            let bt = match self.bts.last() {
                Some(BacktrackInsn::Exhausted) | None => return false,
                Some(&bt) => bt,
            };
            self.bts.pop();
            match bt {
                BacktrackInsn::Exhausted => return false,
                BacktrackInsn::SetPosition {
                    ip: saved_ip,
                    pos: saved_pos,
                } => {
                    *ip = saved_ip;
                    *pos = saved_pos;
                    return true;
                }
                BacktrackInsn::SetLoopData { id, data } => {
                    *self.loops.mat(id as usize) = data;
                }
                BacktrackInsn::EnterLoopBody {
                    id,
                    ip: body,
                    pos: entry,
                } => {
                    *self.loops.mat(id as usize) = Some(entry);
                    *ip = body;
                    *pos = entry;
                    return true;
                }
            }
        }
    }

    /// Attempt to match at a given IP and position.
    /// \return the end position of the first successful path.
    pub(crate) fn try_at_pos(
        &mut self,
        text: &[u8],
        mut ip: IP,
        mut pos: usize,
    ) -> Result<Option<usize>, Error> {
        debug_assert!(
            self.bts.len() == 1,
            "Should be only initial exhausted backtrack insn"
        );
        let re = self.re;
        if re.flags.memoize && self.visited.is_none() {
            self.visited = Some(VisitedSet::new(re.insns.len(), text.len())?);
        }
        let loop_count = re.loops as usize;
        if self.loops.len() != loop_count {
            self.loops.try_reserve_exact(loop_count)?;
            self.loops.resize(loop_count, None);
        }
        let result = self.run(text, &mut ip, &mut pos);
        // Keep only the initial give-up bts.
        self.bts.truncate(1);
        if let Some(visited) = &mut self.visited {
            match &result {
                Ok(None) => visited.attempt.clear(),
                _ => visited.forget_attempt(),
            }
        }
        if let Err(err) = &result {
            trace!("match attempt abandoned: {}", err);
        }
        result
    }

    fn run(&mut self, text: &[u8], ip: &mut IP, pos: &mut usize) -> Result<Option<usize>, Error> {
        let re = self.re;
        let max_steps = re.limits.max_steps;
        let mut steps: usize = 0;
        // These are not really loops, they are just labels that we effectively 'goto'
        // to.
        #[allow(clippy::never_loop)]
        'nextinsn: loop {
            'backtrack: loop {
                steps += 1;
                if steps > max_steps {
                    return Err(Error::StepLimitExceeded(max_steps));
                }

                // Helper macro to either move to the next insn, or backtrack.
                macro_rules! next_or_bt {
                    ($e:expr, $next:expr) => {
                        if $e {
                            *ip = $next as IP;
                            continue 'nextinsn;
                        } else {
                            break 'backtrack;
                        }
                    };
                }

                match *re.insns.iat(*ip) {
                    Insn::Goal => return Ok(Some(*pos)),

                    Insn::MatchAny { next } => {
                        let m = *pos < text.len();
                        if m {
                            *pos += 1;
                        }
                        next_or_bt!(m, next)
                    }

                    Insn::Char { c, next } => {
                        let m = text.get(*pos) == Some(&c);
                        if m {
                            *pos += 1;
                        }
                        next_or_bt!(m, next)
                    }

                    Insn::Bracket { idx, next } => {
                        let bc = re.brackets.iat(idx as usize);
                        let m = text.get(*pos).is_some_and(|&b| bc.contains(b));
                        if m {
                            *pos += 1;
                        }
                        next_or_bt!(m, next)
                    }

                    Insn::Assertion { kind, next } => {
                        next_or_bt!(
                            matchers::assertion_holds(kind, re.flags, text, *pos),
                            next
                        )
                    }

                    Insn::CaptureBoundary { next, .. } => next_or_bt!(true, next),

                    Insn::EnterLoop { id, next } => {
                        // The visited set cuts empty cycles when memoizing.
                        if self.visited.is_none() {
                            self.save_loop_data(id)?;
                            *self.loops.mat(id as usize) = None;
                        }
                        next_or_bt!(true, next)
                    }

                    Insn::LoopAgain { id, body, exit } => {
                        if let Some(visited) = &mut self.visited {
                            if visited.test_and_set(*ip, *pos)? {
                                break 'backtrack;
                            }
                            self.push_backtrack(BacktrackInsn::SetPosition {
                                ip: body as IP,
                                pos: *pos,
                            })?;
                        } else {
                            // An iteration which consumed nothing is not repeated.
                            if *self.loops.iat(id as usize) == Some(*pos) {
                                break 'backtrack;
                            }
                            self.save_loop_data(id)?;
                            self.push_backtrack(BacktrackInsn::EnterLoopBody {
                                id,
                                ip: body as IP,
                                pos: *pos,
                            })?;
                        }
                        // Try leaving first; come back for another iteration.
                        *ip = exit as IP;
                        continue 'nextinsn;
                    }

                    Insn::Split { primary, secondary } => {
                        if let Some(visited) = &mut self.visited {
                            if visited.test_and_set(*ip, *pos)? {
                                break 'backtrack;
                            }
                        }
                        // Try the secondary edge first; come back for the primary.
                        self.push_backtrack(BacktrackInsn::SetPosition {
                            ip: primary as IP,
                            pos: *pos,
                        })?;
                        *ip = secondary as IP;
                        continue 'nextinsn;
                    }
                }
            }

            // This after the backtrack loop.
            // A break 'backtrack will jump here.
            if self.try_backtrack(ip, pos) {
                continue 'nextinsn;
            } else {
                // We have exhausted the backtracking stack.
                debug_assert!(self.bts.len() == 1, "Should have exhausted backtrack stack");
                return Ok(None);
            }
        }
    }
}

#[derive(Debug)]
pub struct BacktrackExecutor<'r, 't> {
    text: &'t [u8],
    matcher: MatchAttempter<'r>,
}

impl exec::MatchProducer for BacktrackExecutor<'_, '_> {
    fn subject(&self) -> &[u8] {
        self.text
    }

    fn compiled(&self) -> &CompiledRegex {
        self.matcher.re
    }

    fn match_at(&mut self, pos: usize) -> Result<Option<usize>, Error> {
        let start = self.matcher.re.start as IP;
        self.matcher.try_at_pos(self.text, start, pos)
    }
}

impl<'r, 't> exec::Executor<'r, 't> for BacktrackExecutor<'r, 't> {
    fn new(re: &'r CompiledRegex, text: &'t [u8]) -> Self {
        Self {
            text,
            matcher: MatchAttempter::new(re),
        }
    }
}

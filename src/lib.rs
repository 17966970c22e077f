/*!

# retro - a small Thompson-construction regex engine

This crate parses a compact regular expression syntax over bytes, compiles it to an arena of instructions, and matches it with a backtracking interpreter.

# Example: test if a subject starts with a match

Matching is a *prefix* match: the pattern must match starting at the first byte of the subject, but nothing after the match needs to be consumed.

```rust
use retro::Regex;
let re = Regex::new("ab").unwrap();
assert!(re.is_match("abz"));
assert!(!re.is_match("ac"));
```

# Example: searching

`find` and `find_iter` try successive start offsets.

```rust
use retro::Regex;
let re = Regex::new("a[xy]").unwrap();
let text = "ba ax bay";
let ranges: Vec<_> = re.find_iter(text).map(|m| m.range()).collect();
assert_eq!(ranges, vec![3..5, 7..9]);
```

# Supported Syntax

- Literal bytes; any byte without a special meaning matches itself.
- `.` matches any byte.
- `[abc]` matches any listed byte. There are no ranges; a leading `^` is skipped and does *not* negate.
- `(...)` is a numbered capture group. Group boundaries are compiled but not reported.
- `a|b` is alternation.
- `*`, `+`, `?` and `{m,n}` are quantifiers. Only the full `{m,n}` form is recognized; anything else starting with `{` is a literal `{`, except at the very start of a pattern, where `{` is an invalid repeat.
- `^` and `$` match at line boundaries, `\A` and `\z` at the subject boundaries.
- `\b` and `\B` are accepted but always succeed.
- Any other escaped byte matches itself.

Quantifiers prefer to stop: `a*` matched against `aaa` reports an empty match. Among alternatives, the last one listed is tried first. An iteration of `*` or `+` which consumed nothing is not repeated, so `(a*)*b` matches `ab`.

# Flags

- `n`: anchors are not checked and always succeed.
- `m`: the backtracking matcher memoizes explored states, which bounds its work by the product of program and subject size.

```rust
use retro::Regex;
let re = Regex::with_flags(r"a\z", "n").unwrap();
assert!(re.is_match("ab"));
```

# Limits

Parsing, compiling and matching are bounded by [`Limits`]. A match attempt which exceeds its budget produces an [`Error`]; `is_match` logs it and reports no match.

# Architecture

retro has a stack-machine parser producing an IR tree, an emitter which lowers the tree to instructions by patching lists of open edges, and two interpreters, referred to as "backends".

The default interpreter is the "classical backtracking" one, which uses an explicit backtracking stack. There is also a PikeVM backend which runs all threads in lockstep and is linear in the subject length.

*/

#![warn(clippy::all)]
#![allow(clippy::upper_case_acronyms, clippy::match_like_matches_macro)]

pub use crate::api::*;
pub use crate::error::Error;
pub use crate::types::Limits;

#[macro_use]
mod util;

mod api;
mod buffer;
mod bytesearch;
mod classicalbacktrack;
mod emit;
mod error;
mod exec;
mod insn;
mod ir;
mod matchers;
mod parse;
mod startpredicate;
mod types;

#[cfg(feature = "backend-pikevm")]
mod pikevm;

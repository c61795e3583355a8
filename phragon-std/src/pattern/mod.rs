//! # Pattern Compiler
//!
//! Turns a path template into a [`Pattern`]: an anchored regex for matching
//! and a generator for the reverse direction.
//!
//! | Template                   | Matches                  | Extracts                |
//! |----------------------------|--------------------------|-------------------------|
//! | `/user/{id}`               | `/user/42`               | `id = "42"`             |
//! | `/user/{id:reg([0-9]+)}`   | `/user/42`, not `/u/abc` | `id = "42"`             |
//! | `/a/{x?}`                  | `/a`, `/a/val`           | nothing, `x = "val"`    |
//! | `/list/{page:int?=1}`      | `/list`, `/list/3`       | `page = "1"`, `page = 3`|
//!
//! Matching runs in two passes: the regex checks the shape, then each
//! modifier's validator checks the meaning. A rejection in either pass is an
//! ordinary "no match", never an error.

mod cache;
mod compiled;
pub mod parser;

pub use cache::PatternCache;
pub use compiled::Pattern;
pub(crate) use compiled::URI_COMPONENT;
pub use parser::{ModifierCall, ParamToken, Token};

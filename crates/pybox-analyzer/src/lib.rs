//! Static import screening for untrusted Python snippets
//!
//! The snippet never runs here. We parse it, walk the syntax tree, and
//! refuse anything that imports a denylisted module. Matching is exact and
//! shallow by contract: `os.path` is compared as the dotted name written,
//! not as a prefix of `os`, and aliasing or `__import__` by computed string
//! slips through. That gap is documented rather than hardened away -- the
//! wall-clock timeout in the sandbox is the second line of defense.

mod policy;
mod verdict;

pub use policy::ImportPolicy;
pub use verdict::Verdict;

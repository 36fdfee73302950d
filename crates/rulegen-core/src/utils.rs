//! Path and pattern helpers shared by the walker and the builder.

pub mod paths;
pub mod patterns;

#[doc(inline)]
pub use paths::{join_rel, module_from_src, relative_path, stem};
#[doc(inline)]
pub use patterns::ExcludeSet;

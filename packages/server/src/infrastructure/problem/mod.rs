//! ProblemCatalog の実装

pub mod builtin;

pub use builtin::BuiltinProblemCatalog;

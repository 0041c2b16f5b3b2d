//! Command definitions and the command tree built from them
//!
//! A configuration file declares commands that either run a shell command or
//! import further configuration files. The tree builder walks those
//! declarations, recursively resolving imports, and produces the tree of
//! [`node::ResolvedCommand`]s the CLI exposes as subcommands.

pub mod builder;
pub mod command;
pub mod imports;
pub mod node;

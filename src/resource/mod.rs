//! Scoped acquisition and release of resources.
//!
//! A [`ResourceChain`] describes how to acquire one or more resources, runs a
//! function against them, and releases every resource it acquired in reverse
//! order, including when acquisition stops halfway or the function panics.
//! Failures never escape: they end up in the returned [`Outcome`](crate::Outcome).
//!
//! Resources implement [`Release`]; anything else can be wrapped in
//! [`Managed`].
//!
//! # Example
//!
//! ```
//! use backstop::resource::with2;
//! use backstop::Managed;
//! use std::io::{Read, Write};
//!
//! let dir = std::env::temp_dir();
//! let source = dir.join("backstop-resource-doc-source.txt");
//! let target = dir.join("backstop-resource-doc-target.txt");
//! std::fs::write(&source, "hello").unwrap();
//!
//! let copied = with2(
//!     || Ok(Managed::dropping(std::fs::File::open(&source)?)),
//!     || Ok(Managed::new(std::fs::File::create(&target)?, |file| Ok(file.sync_all()?))),
//! )
//! .apply2(|input, output| {
//!     let mut buffer = String::new();
//!     input.read_to_string(&mut buffer)?;
//!     output.write_all(buffer.as_bytes())?;
//!     Ok(buffer.len())
//! });
//!
//! assert_eq!(copied.get().unwrap(), 5);
//! assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
//! # std::fs::remove_file(&source).unwrap();
//! # std::fs::remove_file(&target).unwrap();
//! ```

mod chain;
mod release;
mod stack;

pub use chain::{of2, of3, of4, with2, with3, with4, ResourceChain};
pub use release::{Managed, Release};

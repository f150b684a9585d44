//! MHTML to book conversion.
//!
//! Each archive becomes one section: its primary document is parsed, image
//! and stylesheet references found in the archive are materialized and handed
//! to a [`BookWriter`](mhtpub_book::BookWriter), and the rewritten body is
//! added as a section. [`Converter::run`] does this for a list of archives in
//! order and writes the book once all of them succeeded.

mod convert;
pub mod error;
mod naming;
mod resolve;

pub use crate::convert::{Converter, description};
pub use crate::naming::{local_name, stylesheet_name};
pub use crate::resolve::{Resolved, resolve};

//! Settings vocabulary for operating systems and CPU architectures.
//!
//! [`os::is_supported`] is the recipe's platform gate. Host detection feeds
//! the default layer of [`crate::settings::BuildSettings`].

pub mod arch;
pub mod os;

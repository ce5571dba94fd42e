//! Routed pages. Each page is a plain component rendered into the shell's outlet.

mod home;
mod listen;

pub use home::Home;
pub use listen::Listen;

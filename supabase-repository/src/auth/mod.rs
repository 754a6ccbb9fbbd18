//! GoTrue implementation of the destination auth-admin surface.

mod gotrue;

pub use gotrue::GoTrueAdmin;

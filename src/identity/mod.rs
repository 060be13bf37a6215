pub mod firebase;
pub mod google;
pub mod types;

pub use firebase::IdentityToolkit;
pub use google::{GoogleAuth, PollResult};
pub use types::*;

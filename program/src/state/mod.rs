pub mod custody_account;
pub mod events;
pub mod machine;

pub use custody_account::*;
pub use events::*;
pub use machine::*;

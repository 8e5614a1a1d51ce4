pub mod button;
mod debounce;
mod error;

pub use button::{Button, ButtonConfig, Press, pin_for_revision};
pub use debounce::Debouncer;
pub use error::{ButtonResult, Error};

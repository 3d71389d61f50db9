// Utils compartidos

pub mod constants;
pub mod clock;
pub mod i18n;

pub use constants::*;
pub use clock::{Clock, SystemClock};
pub use i18n::*;

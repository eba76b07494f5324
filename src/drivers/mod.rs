//! Pin-level drivers and one-shot hardware initialisation.

pub mod button;
pub mod float_switch;
pub mod gpio;
pub mod hw_init;
pub mod pump;

//! Pure evaluation: slot lock state and frame composition from elapsed time.

pub mod compositor;
pub mod lock;

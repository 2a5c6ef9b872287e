//! Infrastructure layer - Port implementations
//!
//! This module contains concrete implementations of the domain ports on top
//! of the `embedded-hal` and `embedded-storage` abstractions, so any board
//! HAL can plug its pins, bus and flash in.

pub mod drivers;
pub mod repositories;

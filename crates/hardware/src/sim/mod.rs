//! Simulation driver.
//!
//! Provides the pieces needed to run the controller outside of a larger simulator:
//! 1. **Events:** The [`EventScheduler`](event::EventScheduler) clock seam and a binary-heap
//!    [`EventQueue`](event::EventQueue).
//! 2. **Simulator:** Owns a controller and its event queue and steps them cycle by cycle.
//! 3. **Traces:** Text request traces for replay.

/// Event kinds, the scheduler trait, and the event queue.
pub mod event;
/// Controller + event queue driver.
pub mod simulator;
/// Request trace parsing.
pub mod trace;

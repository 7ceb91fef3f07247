//! Falsification tests for the scheduler.
//!
//! Each test tries to break one property of the single-slot scheduler.
//!
//! | Category | ID Range | Description |
//! |----------|----------|-------------|
//! | A | F001-F010 | Slot lifecycle |
//! | B | F011-F020 | Cancel and timer race |
//! | C | F021-F030 | Executor and privilege |

pub mod mocks;

pub use mocks::MockBackend;

//! Delta-T (ADPCM-B) Emulation Domain
//!
//! Register file, address controller, decode engine and the unit that ties
//! them together.
//!
//! Implementation:
//! - `unit` - register-accurate controller state machine

// Internal modules
pub mod address;
pub mod decoder;
pub mod registers;
pub mod tables;
pub mod unit;

// Re-export public API
pub use address::AddressController;
pub use decoder::Decoder;
pub use registers::{Control2, Mode, PortState, Register, RegisterBank};
pub use unit::DeltaT;

// Library surface for the engine, the front-end state and headless tests.
// Rendering stays in the binary.
pub mod app;
pub mod campaign;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod error;
pub mod hints;
pub mod lockout;
pub mod round;
pub mod runtime;
pub mod session;
pub mod validator;

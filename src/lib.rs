#![deny(missing_docs)]

//! A small serial terminal.
//!
//! One window, one serial port at a time.
//! Pick a port, connect at some baud rate, then watch incoming lines
//! and send lines of your own.
//!
//! The [`controller::Controller`] holds all state and logic and knows nothing
//! about the GUI toolkit, so it can be driven directly in tests.
//! The [`gui`] module maps window events onto it.

/// The window controller: connection lifecycle, polling and sending.
pub mod controller;

/// The append-only lines shown in the terminal view.
pub mod terminal_log;

/// The iced application wrapping the controller.
pub mod gui;

/// Serial port abstractions and the real serial port driver.
pub mod serial;

/// Mocked serial ports.
pub mod mock;

/// The command line interface.
pub mod cli;

/// Relates to config files.
pub mod config;

/// Possible errors in this library.
pub mod error;

/// Logging/tracing setup.
pub mod logging;

// Interfaces driving the application layer from outside the process.
pub mod cli;

/// Newline delimited byte frames.
pub mod lines;

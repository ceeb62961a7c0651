pub use constraint::*;

mod constraint;

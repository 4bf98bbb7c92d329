pub mod apply;
pub mod boards;
pub mod check;

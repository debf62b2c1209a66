pub mod remote;
pub mod source;

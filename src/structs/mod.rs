pub mod bitflag;
pub mod loaded;
pub mod raw;

pub mod inspect;
pub mod sweep;
pub mod window;

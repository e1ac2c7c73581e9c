pub mod rut;
pub mod test_utils;
pub mod time;

pub mod logger;
pub mod url;
pub mod value;

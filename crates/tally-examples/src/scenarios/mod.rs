pub mod concurrent_init;
pub mod dead_code;
pub mod init_once;
pub mod tag_overlap;

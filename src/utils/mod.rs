//! 通用工具函数

pub mod path;

pub use path::{resolve_dir, to_abs_path};

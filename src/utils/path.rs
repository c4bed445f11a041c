//! 路径相关的工具函数

use std::path::{Path, PathBuf};

/// 将日志输出路径转换为绝对路径
///
/// `stdout`、`stderr` 与已是绝对路径的项原样保留，其余基于当前工作目录
///
/// # 参数
/// * `paths` - 输出路径列表
pub fn to_abs_path<S: AsRef<str>>(paths: &[S]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty())
        .map(|p| match p {
            "stdout" | "stderr" => PathBuf::from(p),
            _ => resolve_dir(Path::new(p)),
        })
        .collect()
}

/// 基于当前工作目录解析路径，无法获取工作目录时原样返回
pub fn resolve_dir(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            rat_logger::warn!("获取当前工作目录失败: {}", e);
            path.to_path_buf()
        }
    }
}

//! 数据集操作.

use std::path::{Path, PathBuf};

pub mod generic;

pub use generic::{skull_csv_name, sweep_loader, FilenameBuilder, SweepLoader};

/// 获取 `{用户主目录}/data/stereotactic` 目录.
pub fn home_sweep_dir() -> Option<PathBuf> {
    home_dir_with(["data", "stereotactic"])
}

/// 获取 `{用户主目录}/ni_data/templates` 目录.
pub fn home_template_dir() -> Option<PathBuf> {
    home_dir_with(["ni_data", "templates"])
}

/// 获取 `{用户主目录}` 下给定继续项组成的全路径.
pub fn home_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 将路径开头的 `~` 展开为用户主目录.
///
/// 其他路径 (以及无法获取主目录的情况) 原样返回.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(mut home) => {
                home.push(rest);
                home
            }
            None => path.to_owned(),
        },
        Err(_) => path.to_owned(),
    }
}

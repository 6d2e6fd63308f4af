//! 对 `stereo-berry::dataset` 的更一层封装. 提供从环境变量或主目录定位的数据路径.

use stereo_berry::consts::TEMPLATE_40UM;
use stereo_berry::dataset::{self, skull_csv_name, sweep_loader, SweepLoader};
use std::env;
use std::path::{Path, PathBuf};

/// 颅骨扫描目录的环境变量.
pub const DATA_DIR_VAR: &str = "STX_DATA_DIR";

/// 解剖模板文件的环境变量.
pub const TEMPLATE_VAR: &str = "STX_TEMPLATE";

/// 若环境变量 `var` 存在且非空, 返回其值.
fn non_empty_var(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// 获取颅骨扫描 csv 所在目录.
///
/// 1. 若环境变量 `$STX_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/data/stereotactic`;
/// 3. 无法获取主目录时返回 `None`.
pub fn sweep_dir_from_env_or_home() -> Option<PathBuf> {
    non_empty_var(DATA_DIR_VAR).or_else(dataset::home_sweep_dir)
}

/// 获取背景渲染用的解剖模板路径.
///
/// 1. 若环境变量 `$STX_TEMPLATE` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/ni_data/templates/DSURQEc_40micron_average.nii`;
/// 3. 无法获取主目录时返回 `None`.
pub fn template_from_env_or_home() -> Option<PathBuf> {
    non_empty_var(TEMPLATE_VAR)
        .or_else(|| dataset::home_template_dir().map(|d| d.join(TEMPLATE_40UM)))
}

/// 获取 `path` 下 `skull_{编号}.csv` 的加载器.
#[inline]
pub fn skull_loader<I: IntoIterator<Item = u32>, P: AsRef<Path>>(ids: I, path: P) -> SweepLoader {
    sweep_loader(ids, path, skull_csv_name)
}

/// 从 `$STX_DATA_DIR` 或者 `$HOME/data/stereotactic` 下加载颅骨扫描.
#[inline]
pub fn skull_loader_from_env_or_home<I: IntoIterator<Item = u32>>(ids: I) -> Option<SweepLoader> {
    Some(skull_loader(ids, sweep_dir_from_env_or_home()?))
}

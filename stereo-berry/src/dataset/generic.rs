//! 通用颅骨扫描加载器.
//!
//! 提供迭代器风格的批量数据获取模式. 一般一只动物对应一个 `skull_{编号}.csv` 文件.

use crate::data::SkullSweep;
use crate::Result;
use std::path::{Path, PathBuf};

/// 文件名构造器. 接受动物编号, 获得文件名.
pub type FilenameBuilder = fn(u32) -> String;

/// 默认文件名构造器: `skull_{id}.csv`.
#[inline]
pub fn skull_csv_name(id: u32) -> String {
    format!("skull_{id}.csv")
}

/// 从指定编号、路径、文件名构造器来创建颅骨扫描加载器.
///
/// # 注意
///
/// `ids` 的所有取值 `value` 必须在 `path` 下有形如 `builder(value)` 的 csv
/// 文件, 否则加载器在迭代时会返回 `Result::Err`.
/// `path` 开头的 `~` 会被展开.
pub fn sweep_loader<I: IntoIterator<Item = u32>, P: AsRef<Path>>(
    ids: I,
    path: P,
    builder: FilenameBuilder,
) -> SweepLoader {
    let path = crate::dataset::expand_home(path.as_ref());

    let mut ids: Vec<u32> = ids.into_iter().collect();
    ids.reverse();

    SweepLoader {
        path,
        ids_rev: ids,
        builder,
    }
}

/// 颅骨扫描数据加载器, 并在内部自动转换文件名.
#[derive(Debug)]
pub struct SweepLoader {
    path: PathBuf,
    ids_rev: Vec<u32>,
    builder: FilenameBuilder,
}

impl SweepLoader {
    /// 给定编号对应的文件路径.
    pub fn path_of(&self, id: u32) -> PathBuf {
        self.path.join((self.builder)(id))
    }
}

impl Iterator for SweepLoader {
    type Item = (u32, Result<SkullSweep>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids_rev.pop()?;

        self.path.push((self.builder)(id));
        let data = SkullSweep::open(self.path.as_path());
        self.path.pop();

        Some((id, data))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.ids_rev.len(), Some(self.ids_rev.len()))
    }
}

impl ExactSizeIterator for SweepLoader {
    #[inline]
    fn len(&self) -> usize {
        self.ids_rev.len()
    }
}

//! 图像的持久化存储.

use image::ImageResult;
use std::path::Path;

use super::canvas::Canvas;
use crate::dataset::expand_home;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 图像格式由 `path` 的扩展名决定 (一般为 `.png`). 路径开头的 `~` 会被展开.
pub trait ImgWriteVis {
    /// 将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

impl ImgWriteVis for Canvas {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let path = expand_home(path.as_ref());
        log::info!("saving {}x{} image to `{}`", self.width(), self.height(), path.display());
        self.image().save(path)
    }
}

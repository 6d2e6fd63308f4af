//! 二维画布.
//!
//! 画布使用矢状面上以毫米为单位的坐标: 后 -> 前 (PA) 向右增长, 下 -> 上 (IS) 向上增长.
//! 图像像素则按照行优先 `(x, y)` 组织, `y` 向下增长, 因此 `y = (is_max - is) * 缩放`.

use image::{Rgb, RgbImage};
use num::ToPrimitive;

use super::RenderError;
use crate::consts::color;

/// 画布边长上限 (像素).
pub const MAX_SIDE: u32 = 8192;

/// 像素坐标. 允许越出画布.
type Pixel = (i64, i64);

/// 矢状面上的一块矩形视野, 及其到像素的映射.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pa_min: f64,
    pa_max: f64,
    is_min: f64,
    is_max: f64,
    /// 每毫米的像素数.
    scale: f64,
}

impl Viewport {
    /// 以 `pa = (min, max)`, `is = (min, max)` 为范围, 每毫米 `px_per_mm` 个像素构建视野.
    ///
    /// # 返回值
    ///
    /// - 范围非有限或 `min > max` 时返回 `Err(RenderError::EmptyScene)`;
    /// - `px_per_mm` 不是正的有限值时返回 `Err(RenderError::InvalidScale)`;
    /// - 画布任一边长超过 [`MAX_SIDE`] 时返回 `Err(RenderError::TooLarge)`.
    pub fn new(pa: (f64, f64), is: (f64, f64), px_per_mm: f64) -> Result<Self, RenderError> {
        if !(px_per_mm.is_finite() && px_per_mm > 0.0) {
            return Err(RenderError::InvalidScale(px_per_mm));
        }
        let valid = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && lo <= hi;
        if !valid(pa) || !valid(is) {
            return Err(RenderError::EmptyScene);
        }
        let ans = Self {
            pa_min: pa.0,
            pa_max: pa.1,
            is_min: is.0,
            is_max: is.1,
            scale: px_per_mm,
        };
        let (w, h) = (ans.side(pa), ans.side(is));
        match (w, h) {
            (Some(w), Some(h)) if w <= MAX_SIDE && h <= MAX_SIDE => Ok(ans),
            _ => Err(RenderError::TooLarge(
                w.unwrap_or(u32::MAX),
                h.unwrap_or(u32::MAX),
            )),
        }
    }

    /// 包含 `points` 中所有 `(pa, is)` 且四周留出 `margin_mm` 的最小视野.
    pub fn fit<I: IntoIterator<Item = (f64, f64)>>(
        points: I,
        margin_mm: f64,
        px_per_mm: f64,
    ) -> Result<Self, RenderError> {
        let mut pa = (f64::INFINITY, f64::NEG_INFINITY);
        let mut is = (f64::INFINITY, f64::NEG_INFINITY);
        for (p, i) in points.into_iter().filter(|(p, i)| p.is_finite() && i.is_finite()) {
            pa = (pa.0.min(p), pa.1.max(p));
            is = (is.0.min(i), is.1.max(i));
        }
        let margin = margin_mm.max(0.0);
        Self::new(
            (pa.0 - margin, pa.1 + margin),
            (is.0 - margin, is.1 + margin),
            px_per_mm,
        )
    }

    /// 每毫米的像素数.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// 画布宽度 (像素).
    #[inline]
    pub fn width(&self) -> u32 {
        self.side((self.pa_min, self.pa_max)).unwrap_or(1)
    }

    /// 画布高度 (像素).
    #[inline]
    pub fn height(&self) -> u32 {
        self.side((self.is_min, self.is_max)).unwrap_or(1)
    }

    /// 视野对角线长度 (毫米).
    #[inline]
    pub fn diagonal_mm(&self) -> f64 {
        (self.pa_max - self.pa_min).hypot(self.is_max - self.is_min)
    }

    /// `(pa, is)` -> 像素 `(x, y)`. 无法用 `i64` 表示时返回 `None`.
    #[inline]
    pub fn to_pixel(&self, pa: f64, is: f64) -> Option<Pixel> {
        let x = ((pa - self.pa_min) * self.scale).round().to_i64()?;
        let y = ((self.is_max - is) * self.scale).round().to_i64()?;
        Some((x, y))
    }

    /// 像素 `(x, y)` 中心 -> `(pa, is)`.
    #[inline]
    pub fn to_world(&self, x: u32, y: u32) -> (f64, f64) {
        (
            self.pa_min + x as f64 / self.scale,
            self.is_max - y as f64 / self.scale,
        )
    }

    /// 将线段 `a -> b` 裁剪到视野内 (Liang-Barsky). 完全在视野外时返回 `None`.
    pub fn clip(&self, a: (f64, f64), b: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in [
            (-dx, a.0 - self.pa_min),
            (dx, self.pa_max - a.0),
            (-dy, a.1 - self.is_min),
            (dy, self.is_max - a.1),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    t0 = t0.max(r);
                } else {
                    t1 = t1.min(r);
                }
            }
        }
        (t0 <= t1).then(|| {
            (
                (a.0 + t0 * dx, a.1 + t0 * dy),
                (a.0 + t1 * dx, a.1 + t1 * dy),
            )
        })
    }

    fn side(&self, (lo, hi): (f64, f64)) -> Option<u32> {
        ((hi - lo) * self.scale).ceil().to_u32()?.checked_add(1)
    }
}

/// RGB 画布.
#[derive(Clone, Debug)]
pub struct Canvas {
    img: RgbImage,
    view: Viewport,
}

impl Canvas {
    /// 以纯色 `background` 创建画布.
    pub fn new(view: Viewport, background: color::Rgb) -> Self {
        Self {
            img: RgbImage::from_pixel(view.width(), view.height(), Rgb(background)),
            view,
        }
    }

    /// 宽度 (像素).
    #[inline]
    pub fn width(&self) -> u32 {
        self.img.width()
    }

    /// 高度 (像素).
    #[inline]
    pub fn height(&self) -> u32 {
        self.img.height()
    }

    /// 视野.
    #[inline]
    pub fn view(&self) -> &Viewport {
        &self.view
    }

    /// 底层图像.
    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.img
    }

    /// 获取像素颜色. 越界时返回 `None`.
    #[inline]
    pub fn pixel(&self, x: i64, y: i64) -> Option<color::Rgb> {
        let (x, y) = self.check((x, y))?;
        Some(self.img.get_pixel(x, y).0)
    }

    /// 设置像素颜色. 越界时什么也不做.
    #[inline]
    pub fn put(&mut self, x: i64, y: i64, c: color::Rgb) {
        if let Some((x, y)) = self.check((x, y)) {
            self.img.put_pixel(x, y, Rgb(c));
        }
    }

    /// 以 `(pa, is)` 为圆心, 半径 `radius` 像素画实心圆.
    pub fn disc(&mut self, pa: f64, is: f64, radius: u32, c: color::Rgb) {
        if let Some(center) = self.view.to_pixel(pa, is) {
            self.disc_px(center, radius, c);
        }
    }

    /// 以 `(pa, is)` 为中心, 半径 `radius` 像素画实心菱形.
    pub fn diamond(&mut self, pa: f64, is: f64, radius: u32, c: color::Rgb) {
        let Some((cx, cy)) = self.view.to_pixel(pa, is) else {
            return;
        };
        let r = radius as i64;
        for dy in -r..=r {
            let span = r - dy.abs();
            for dx in -span..=span {
                self.put(cx + dx, cy + dy, c);
            }
        }
    }

    /// 填充以 `(pa0, is0)`, `(pa1, is1)` 为对角的矩形 (含边界).
    pub fn fill_rect(&mut self, (pa0, is0): (f64, f64), (pa1, is1): (f64, f64), c: color::Rgb) {
        let (Some(p0), Some(p1)) = (self.view.to_pixel(pa0, is0), self.view.to_pixel(pa1, is1))
        else {
            return;
        };
        let w = i64::from(self.width());
        let h = i64::from(self.height());
        let (x0, x1) = (p0.0.min(p1.0).max(0), p0.0.max(p1.0).min(w - 1));
        let (y0, y1) = (p0.1.min(p1.1).max(0), p0.1.max(p1.1).min(h - 1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.put(x, y, c);
            }
        }
    }

    /// 画线段 `a -> b`, 线宽 `thickness` 像素. 视野外的部分会被裁剪掉.
    pub fn segment(&mut self, a: (f64, f64), b: (f64, f64), thickness: u32, c: color::Rgb) {
        let Some((a, b)) = self.view.clip(a, b) else {
            return;
        };
        let (Some(p0), Some(p1)) = (self.view.to_pixel(a.0, a.1), self.view.to_pixel(b.0, b.1))
        else {
            return;
        };
        let radius = thickness.saturating_sub(1) / 2;
        for p in bresenham(p0, p1) {
            if radius == 0 {
                self.put(p.0, p.1, c);
            } else {
                self.disc_px(p, radius, c);
            }
        }
    }

    fn disc_px(&mut self, (cx, cy): Pixel, radius: u32, c: color::Rgb) {
        let r = radius as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.put(cx + dx, cy + dy, c);
                }
            }
        }
    }

    #[inline]
    fn check(&self, (x, y): Pixel) -> Option<(u32, u32)> {
        let x = x.to_u32()?;
        let y = y.to_u32()?;
        (x < self.img.width() && y < self.img.height()).then_some((x, y))
    }
}

/// Bresenham 直线光栅化, 包含两个端点.
fn bresenham((mut x0, mut y0): Pixel, (x1, y1): Pixel) -> Vec<Pixel> {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut ans = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        ans.push((x0, y0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::{bresenham, Canvas, Viewport, MAX_SIDE};
    use crate::consts::color::{BLACK, WHITE};
    use crate::render::RenderError;

    fn view() -> Viewport {
        // 10 mm x 5 mm, 每毫米 10 像素.
        Viewport::new((-5.0, 5.0), (-4.0, 1.0), 10.0).unwrap()
    }

    #[test]
    fn test_viewport_mapping() {
        let v = view();
        assert_eq!((v.width(), v.height()), (101, 51));
        assert_eq!(v.to_pixel(-5.0, 1.0), Some((0, 0)));
        assert_eq!(v.to_pixel(5.0, -4.0), Some((100, 50)));
        assert_eq!(v.to_pixel(0.0, 0.0), Some((50, 10)));
        assert_eq!(v.to_world(50, 10), (0.0, 0.0));
    }

    #[test]
    fn test_viewport_errors() {
        assert_eq!(
            Viewport::new((0.0, 1.0), (0.0, 1.0), 0.0),
            Err(RenderError::InvalidScale(0.0))
        );
        assert_eq!(
            Viewport::new((1.0, 0.0), (0.0, 1.0), 1.0),
            Err(RenderError::EmptyScene)
        );
        assert!(matches!(
            Viewport::new((0.0, MAX_SIDE as f64), (0.0, 1.0), 1.0),
            Err(RenderError::TooLarge(..))
        ));
        assert_eq!(
            Viewport::fit(std::iter::empty(), 1.0, 10.0),
            Err(RenderError::EmptyScene)
        );
    }

    #[test]
    fn test_viewport_fit() {
        let v = Viewport::fit([(0.0, 0.0), (2.0, -1.0)], 1.0, 1.0).unwrap();
        assert_eq!(v, Viewport::new((-1.0, 3.0), (-2.0, 1.0), 1.0).unwrap());
    }

    #[test]
    fn test_clip() {
        let v = view();
        let (a, b) = v.clip((-10.0, 0.0), (10.0, 0.0)).unwrap();
        assert_eq!(a, (-5.0, 0.0));
        assert_eq!(b, (5.0, 0.0));
        assert!(v.clip((-10.0, 3.0), (10.0, 3.0)).is_none());

        // 完全在视野内的线段保持不变.
        let inner = ((-1.0, -1.0), (1.0, 0.5));
        assert_eq!(v.clip(inner.0, inner.1), Some(inner));
    }

    #[test]
    fn test_bresenham() {
        assert_eq!(bresenham((0, 0), (3, 0)), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(bresenham((0, 0), (2, 2)), vec![(0, 0), (1, 1), (2, 2)]);
        let steep = bresenham((0, 0), (1, 5));
        assert_eq!(steep.len(), 6);
        assert_eq!(steep.last(), Some(&(1, 5)));
    }

    #[test]
    fn test_canvas_drawing() {
        let mut c = Canvas::new(view(), WHITE);
        assert_eq!(c.pixel(0, 0), Some(WHITE));
        assert_eq!(c.pixel(-1, 0), None);

        c.disc(0.0, 0.0, 2, BLACK);
        assert_eq!(c.pixel(50, 10), Some(BLACK));
        assert_eq!(c.pixel(52, 10), Some(BLACK));
        assert_eq!(c.pixel(52, 12), Some(WHITE));

        c.segment((-10.0, -3.0), (10.0, -3.0), 1, BLACK);
        assert_eq!(c.pixel(0, 40), Some(BLACK));
        assert_eq!(c.pixel(100, 40), Some(BLACK));
        assert_eq!(c.pixel(100, 41), Some(WHITE));

        c.fill_rect((4.0, 0.9), (4.2, 0.7), BLACK);
        assert_eq!(c.pixel(90, 1), Some(BLACK));
        assert_eq!(c.pixel(92, 3), Some(BLACK));
        assert_eq!(c.pixel(93, 3), Some(WHITE));

        c.diamond(-4.0, 0.0, 1, BLACK);
        assert_eq!(c.pixel(10, 9), Some(BLACK));
        assert_eq!(c.pixel(11, 9), Some(WHITE));

        // 越界绘制不会 panic.
        c.disc(100.0, 100.0, 3, BLACK);
        c.put(i64::MAX, 0, BLACK);
    }
}

use itertools::{Itertools, MinMaxResult};

/// 灰度窗口, 包含窗位 (level) 和窗宽 (width). 用于把模板强度映射为 8-bit 灰度.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct IntensityWindow {
    level: f32,
    width: f32,
}

impl IntensityWindow {
    /// 构建窗口.
    ///
    /// `level` 必须是有限值, `width` 必须是正的有限值, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<IntensityWindow> {
        if level.is_finite() && width.is_finite() && width > 0.0 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 以 `[lower, upper]` 为窗口范围构建.
    #[inline]
    pub fn from_bounds(lower: f32, upper: f32) -> Option<IntensityWindow> {
        Self::new((lower + upper) / 2.0, upper - lower)
    }

    /// 覆盖 `values` 中全部有限值的窗口.
    ///
    /// 没有有限值, 或所有有限值都相等时返回 `None`.
    pub fn spanning<'a, I: IntoIterator<Item = &'a f32>>(values: I) -> Option<IntensityWindow> {
        match values
            .into_iter()
            .filter(|v| v.is_finite())
            .map(|&v| ordered_float::OrderedFloat(v))
            .minmax()
        {
            MinMaxResult::MinMax(lo, hi) => Self::from_bounds(lo.0, hi.0),
            _ => None,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 求在当前窗口设置下, `v` 对应的灰度图像素整数值 (0 <= value <= 255)
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        if v <= lb {
            Some(u8::MIN)
        } else if v >= self.upper_bound() {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((v - lb) / self.width()) * 255.0) as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IntensityWindow;

    fn is_valid_init(level: f32, width: f32) -> bool {
        IntensityWindow::new(level, width).is_some()
    }

    #[test]
    fn test_window_invalid_input() {
        assert!(!is_valid_init(0.0, -1.0));
        assert!(!is_valid_init(0.0, 0.0));
        assert!(!is_valid_init(f32::NAN, 1.0));
    }

    #[test]
    fn test_window_generic() {
        // [60, 100]
        let w = IntensityWindow::new(80.0, 40.0).unwrap();
        assert_eq!(w.eval(f32::NAN), None);
        assert_eq!(w.eval(f32::MIN), Some(0));
        assert_eq!(w.eval(f32::MAX), Some(255));

        assert_eq!(w.eval(60.0), Some(0));
        assert_eq!(w.eval(70.0).unwrap(), (255.0 * 0.25) as u8);
        assert_eq!(w.eval(80.0).unwrap(), (255.0 * 0.5) as u8);

        // boundary
        assert_eq!(w.eval(99.999), Some(254));
        assert_eq!(w.eval(100.0), Some(255));
    }

    #[test]
    fn test_window_spanning() {
        let values = [3.0, f32::NAN, -1.0, 7.0];
        let w = IntensityWindow::spanning(&values).unwrap();
        assert_eq!(w.lower_bound(), -1.0);
        assert_eq!(w.upper_bound(), 7.0);

        assert!(IntensityWindow::spanning(&[2.0, 2.0]).is_none());
        assert!(IntensityWindow::spanning(&[]).is_none());
    }
}

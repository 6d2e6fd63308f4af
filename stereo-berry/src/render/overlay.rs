//! 解剖模板上的矢状面叠加图.

use itertools::iproduct;

use super::canvas::{Canvas, Viewport};
use super::nii::{NiftiHeaderAttr, TemplateVolume, VoxelGrid};
use super::window::IntensityWindow;
use super::RenderError;
use crate::consts::color::{self, Rgb};
use crate::data::{ResolvedSweep, StereoPoint};
use crate::trajectory::Trajectory;

/// 模板叠加图的绘制选项.
///
/// 颜色为 `None` 时不绘制对应的要素.
#[derive(Clone, Debug)]
pub struct OverlayPlot {
    /// 矢状切面所在的 `lr` 坐标.
    pub lr_cut: f64,
    /// 每毫米的像素数.
    pub px_per_mm: f64,
    /// 灰度窗口. 为 `None` 时覆盖模板的全部强度范围.
    pub window: Option<IntensityWindow>,
    /// 颅骨体素.
    pub skull: Option<Rgb>,
    /// 颅骨点在植入轴上的投影体素.
    pub projection: Option<Rgb>,
    /// 目标点标记.
    pub target: Option<Rgb>,
    /// 入口标记.
    pub entry: Option<Rgb>,
    /// 标记半径 (像素).
    pub marker_radius: u32,
    /// 模板范围之外的背景色.
    pub background: Rgb,
}

impl Default for OverlayPlot {
    fn default() -> Self {
        Self {
            lr_cut: 0.0,
            px_per_mm: 25.0,
            window: None,
            skull: Some(color::SKULL),
            projection: None,
            target: Some(color::TARGET_MARKER),
            entry: Some(color::WHITE),
            marker_radius: 6,
            background: color::BLACK,
        }
    }
}

impl OverlayPlot {
    /// 在 `template` 的矢状切面上叠加 `sweep` 的颅骨体素, 以及 (若给出) `plan` 的目标和入口.
    ///
    /// 没有 `plan` 时, 入口取自 `sweep` 中 ID 为 `incision` 的行 (若存在).
    pub fn render(
        &self,
        template: &TemplateVolume,
        sweep: &ResolvedSweep,
        plan: Option<&Trajectory>,
    ) -> Result<Canvas, RenderError> {
        let grid = template.grid()?;
        let (nx, ny, nz) = grid.dims();
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(RenderError::EmptyScene);
        }

        // 体素中心在矢状面上的范围.
        let last = |n: usize| (n - 1) as f64;
        let corners = iproduct!([0.0, last(nx)], [0.0, last(ny)], [0.0, last(nz)])
            .map(|v| grid.voxel_to_world(v))
            .map(|p| (p.pa, p.is));
        let view = Viewport::fit(corners, 0.0, self.px_per_mm)?;

        let window = match self.window {
            Some(w) => w,
            None => IntensityWindow::spanning(template.data().iter())
                .ok_or(RenderError::FlatTemplate)?,
        };
        log::debug!(
            "overlay at lr = {}: {}x{} px, window [{}, {}]",
            self.lr_cut,
            view.width(),
            view.height(),
            window.lower_bound(),
            window.upper_bound()
        );

        let mut canvas = Canvas::new(view, self.background);
        for (y, x) in iproduct!(0..canvas.height(), 0..canvas.width()) {
            let (pa, is) = view.to_world(x, y);
            let Some(idx) = grid.locate(&StereoPoint::new(pa, is, self.lr_cut)) else {
                continue;
            };
            if let Some(g) = window.eval(template.value(idx)) {
                canvas.put(i64::from(x), i64::from(y), [g; 3]);
            }
        }

        if let Some(c) = self.skull {
            self.voxels(&mut canvas, &grid, sweep.skull().map(|p| p.position), c);
        }
        if let (Some(t), Some(c)) = (plan, self.projection) {
            self.voxels(&mut canvas, &grid, t.projections.iter().map(|p| p.projection), c);
        }
        if let (Some(t), Some(c)) = (plan, self.target) {
            canvas.disc(t.target.pa, t.target.is, self.marker_radius, c);
        }
        let entry = match plan {
            Some(t) => Some(t.entry),
            None => sweep.incision().map(|p| p.position),
        };
        if let (Some(e), Some(c)) = (entry, self.entry) {
            canvas.disc(e.pa, e.is, self.marker_radius, c);
        }
        Ok(canvas)
    }

    /// 填充 `points` 所在且与切面相交的体素.
    fn voxels<I: IntoIterator<Item = StereoPoint>>(
        &self,
        canvas: &mut Canvas,
        grid: &VoxelGrid,
        points: I,
        c: Rgb,
    ) {
        // 体素在 PA, IS 方向上的半宽.
        let a = grid.affine();
        let half = |r: usize| (a[r][0].abs() + a[r][1].abs() + a[r][2].abs()) / 2.0;
        let (half_pa, half_is) = (half(1), half(2));

        for p in points {
            let Some(idx) = grid.locate(&p) else {
                continue;
            };
            let center = grid.voxel_to_world((idx.0 as f64, idx.1 as f64, idx.2 as f64));
            let on_cut = StereoPoint {
                lr: self.lr_cut,
                ..center
            };
            if grid.locate(&on_cut) != Some(idx) {
                continue;
            }
            canvas.fill_rect(
                (center.pa - half_pa, center.is - half_is),
                (center.pa + half_pa, center.is + half_is),
                c,
            );
        }
    }
}

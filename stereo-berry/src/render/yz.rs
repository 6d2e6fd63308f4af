//! 矢状面 (PA-IS) 散点图.

use super::canvas::{Canvas, Viewport};
use super::RenderError;
use crate::consts::color::{self, Rgb};
use crate::data::ResolvedSweep;
use crate::trajectory::Trajectory;

/// 矢状面散点图的绘制选项.
///
/// 颜色为 `None` 时不绘制对应的要素.
#[derive(Clone, Debug)]
pub struct YzPlot {
    /// 颅骨点.
    pub skull: Option<Rgb>,
    /// 脑区点.
    pub brain: Option<Rgb>,
    /// 目标点.
    pub target: Option<Rgb>,
    /// 植入物 (入口 -> 目标的线段) 及植入轴.
    pub implant: Option<Rgb>,
    /// 切口 (入口).
    pub incision: Option<Rgb>,
    /// 颅骨点在植入轴上的投影. 主要用于调试.
    pub projection: Option<Rgb>,
    /// 是否绘制植入轴.
    pub implant_axis: bool,
    /// 每毫米的像素数.
    pub px_per_mm: f64,
    /// 数据范围四周的留白 (毫米).
    pub margin_mm: f64,
    /// 点的半径 (像素).
    pub point_radius: u32,
    /// 背景色.
    pub background: Rgb,
}

impl Default for YzPlot {
    fn default() -> Self {
        Self {
            skull: Some(color::SKULL),
            brain: None,
            target: Some(color::TARGET),
            implant: Some(color::IMPLANT),
            incision: Some(color::INCISION),
            projection: None,
            implant_axis: true,
            px_per_mm: 100.0,
            margin_mm: 1.0,
            point_radius: 4,
            background: color::WHITE,
        }
    }
}

impl YzPlot {
    /// 绘制 `sweep` 中的点, 以及 (若给出) `plan` 的目标, 入口, 植入物和植入轴.
    ///
    /// 没有 `plan` 时, 切口取自 `sweep` 中 ID 为 `incision` 的行 (若存在).
    /// 坐标轴等比例: PA 向右增长, IS 向上增长.
    pub fn render(
        &self,
        sweep: &ResolvedSweep,
        plan: Option<&Trajectory>,
    ) -> Result<Canvas, RenderError> {
        let incision = match plan {
            Some(t) => Some(t.entry),
            None => sweep.incision().map(|p| p.position),
        };

        let mut scene: Vec<(f64, f64)> = sweep
            .points()
            .iter()
            .map(|p| (p.position.pa, p.position.is))
            .collect();
        if let Some(t) = plan {
            scene.push((t.target.pa, t.target.is));
            scene.push((t.entry.pa, t.entry.is));
            if self.projection.is_some() {
                scene.extend(t.projections.iter().map(|p| (p.projection.pa, p.projection.is)));
            }
        }
        let view = Viewport::fit(scene, self.margin_mm, self.px_per_mm)?;
        log::debug!(
            "yz plot: {}x{} px at {} px/mm",
            view.width(),
            view.height(),
            view.scale()
        );
        let mut canvas = Canvas::new(view, self.background);
        let r = self.point_radius;

        // 植入轴在最底层.
        if let (Some(t), Some(c), true) = (plan, self.implant, self.implant_axis) {
            let u = t.direction();
            let reach = view.diagonal_mm() * 2.0 + 1.0;
            let a = t.target - u * reach;
            let b = t.target + u * reach;
            canvas.segment((a.pa, a.is), (b.pa, b.is), 1, c);
        }
        if let Some(c) = self.skull {
            for p in sweep.skull() {
                canvas.disc(p.position.pa, p.position.is, r, c);
            }
        }
        if let Some(c) = self.brain {
            for p in sweep.brain() {
                canvas.disc(p.position.pa, p.position.is, r, c);
            }
        }
        if let (Some(t), Some(c)) = (plan, self.projection) {
            for p in &t.projections {
                canvas.disc(p.projection.pa, p.projection.is, r.saturating_sub(1), c);
            }
        }
        if let (Some(t), Some(c)) = (plan, self.target) {
            canvas.disc(t.target.pa, t.target.is, r, c);
        }
        if let (Some(e), Some(c)) = (incision, self.incision) {
            canvas.diamond(e.pa, e.is, r + 1, c);
        }
        if let (Some(t), Some(e), Some(c)) = (plan, incision, self.implant) {
            canvas.segment((e.pa, e.is), (t.target.pa, t.target.is), 3, c);
        }
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::YzPlot;
    use crate::consts::color::{BLACK, IMPLANT, INCISION, SKULL, TARGET, WHITE};
    use crate::data::{ResolvedPoint, ResolvedSweep, StereoPoint, Tissue};
    use crate::render::RenderError;
    use crate::trajectory::{project_target, InsertionAngle, Target};

    fn sweep() -> ResolvedSweep {
        let point = |id: &str, tissue: Tissue, pa: f64, is: f64| ResolvedPoint {
            id: id.to_owned(),
            tissue,
            reference: "bregma".to_owned(),
            position: StereoPoint::sagittal(pa, is),
        };
        ResolvedSweep::new(
            "bregma",
            vec![
                point("s0", Tissue::Skull, -2.0, 0.0),
                point("s1", Tissue::Skull, 0.0, 0.0),
                point("s2", Tissue::Skull, 2.0, 0.0),
                point("vta", Tissue::Brain, 0.0, -4.0),
            ],
        )
    }

    fn plot() -> YzPlot {
        YzPlot {
            px_per_mm: 10.0,
            point_radius: 2,
            ..YzPlot::default()
        }
    }

    #[test]
    fn test_yz_without_plan() {
        let canvas = plot().render(&sweep(), None).unwrap();
        // PA [-3, 3], IS [-5, 1].
        assert_eq!((canvas.width(), canvas.height()), (61, 61));
        // s0 = (-2, 0) -> (10, 10).
        assert_eq!(canvas.pixel(10, 10), Some(SKULL));
        // 脑区点默认不绘制.
        assert_eq!(canvas.pixel(30, 50), Some(WHITE));
    }

    #[test]
    fn test_yz_with_plan() {
        let s = sweep();
        let plan = project_target(
            &s,
            &Target::from("vta"),
            InsertionAngle::stereotaxic(0.0).unwrap(),
        )
        .unwrap();
        let canvas = plot().render(&s, Some(&plan)).unwrap();

        // 目标 (0, -4) -> (30, 50) 被植入物线段覆盖.
        assert_eq!(canvas.pixel(30, 50), Some(IMPLANT));
        // 目标圆盘的边缘.
        assert_eq!(canvas.pixel(32, 50), Some(TARGET));
        // 植入物连接入口和目标.
        assert_eq!(canvas.pixel(30, 30), Some(IMPLANT));
        // 入口菱形.
        assert_eq!(canvas.pixel(33, 10), Some(INCISION));
        // 其他颅骨点.
        assert_eq!(canvas.pixel(50, 10), Some(SKULL));
        // 植入轴延伸到画布底部.
        assert_eq!(canvas.pixel(30, 60), Some(IMPLANT));
    }

    #[test]
    fn test_yz_disabled_features() {
        let s = sweep();
        let plan = project_target(
            &s,
            &Target::from("vta"),
            InsertionAngle::stereotaxic(0.0).unwrap(),
        )
        .unwrap();
        let options = YzPlot {
            skull: None,
            implant: None,
            incision: None,
            background: BLACK,
            ..plot()
        };
        let canvas = options.render(&s, Some(&plan)).unwrap();
        assert_eq!(canvas.pixel(10, 10), Some(BLACK));
        assert_eq!(canvas.pixel(30, 30), Some(BLACK));
        assert_eq!(canvas.pixel(30, 50), Some(TARGET));
    }

    #[test]
    fn test_yz_empty() {
        let empty = ResolvedSweep::new("bregma", vec![]);
        assert_eq!(
            plot().render(&empty, None).unwrap_err(),
            RenderError::EmptyScene
        );
    }
}

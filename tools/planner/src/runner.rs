//! 程序运行函数.

use std::path::{Path, PathBuf};

use anyhow::Context;
use stereo_berry::consts::INCISION_ID;
use stereo_berry::prelude::*;
use stereo_berry::PlanError;

/// 单次规划的参数.
#[derive(Clone, Debug)]
pub struct PlanRequest {
    /// 植入目标.
    pub target: Target,
    /// 植入角度. 为 `None` 时使用表中的 `incision` 行作为入口.
    pub angle: Option<InsertionAngle>,
    /// 最终参考点.
    pub reference: String,
}

/// 规划结果, 连同解析后的测量点.
#[derive(Clone, Debug)]
pub struct Planned {
    /// 参考系解析后的测量点.
    pub sweep: ResolvedSweep,
    /// 植入轨迹.
    pub trajectory: Trajectory,
}

/// 对一张颅骨扫描表进行规划.
pub fn plan(sweep: &SkullSweep, req: &PlanRequest) -> stereo_berry::Result<Planned> {
    let resolved = sweep.resolve(&req.reference)?;
    let trajectory = match req.angle {
        Some(angle) => project_target(&resolved, &req.target, angle)?,
        None => {
            let target = req.target.locate(&resolved)?;
            let incision = resolved
                .incision()
                .ok_or_else(|| PlanError::UnknownTarget(INCISION_ID.to_owned()))?;
            Trajectory::from_incision(target, incision.position)?
        }
    };
    Ok(Planned {
        sweep: resolved,
        trajectory,
    })
}

/// 将输出路径中的 `{id}` 替换为 `label`.
pub fn output_path(pattern: &Path, label: &str) -> PathBuf {
    PathBuf::from(pattern.to_string_lossy().replace("{id}", label))
}

/// 渲染输出设置. 模板只在第一次需要时加载.
#[derive(Debug)]
pub struct Renderer {
    /// 矢状面散点图输出路径.
    pub png: Option<PathBuf>,
    /// 模板叠加图输出路径.
    pub overlay: Option<PathBuf>,
    /// 叠加图背景模板.
    pub template: Option<PathBuf>,
    /// 颅骨掩膜输出路径.
    pub mask: Option<PathBuf>,
    /// 颅骨掩膜参考模板.
    pub mask_template: Option<PathBuf>,
    loaded_template: Option<TemplateVolume>,
    loaded_mask_template: Option<TemplateVolume>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// 不做任何输出的渲染设置.
    pub fn new() -> Self {
        Self {
            png: None,
            overlay: None,
            template: None,
            mask: None,
            mask_template: None,
            loaded_template: None,
            loaded_mask_template: None,
        }
    }

    /// 是否有任何输出?
    pub fn is_active(&self) -> bool {
        self.png.is_some() || self.overlay.is_some() || self.mask.is_some()
    }

    /// 输出路径模板中是否都包含 `{id}`?
    pub fn is_per_sweep(&self) -> bool {
        [&self.png, &self.overlay, &self.mask]
            .into_iter()
            .flatten()
            .all(|p| p.to_string_lossy().contains("{id}"))
    }

    /// 为 `planned` 生成全部输出.
    pub fn render(&mut self, planned: &Planned, label: &str) -> anyhow::Result<()> {
        if let Some(pattern) = &self.png {
            let path = output_path(pattern, label);
            let canvas = YzPlot::default().render(&planned.sweep, Some(&planned.trajectory))?;
            canvas
                .save(&path)
                .with_context(|| format!("saving sagittal plot `{}`", path.display()))?;
        }
        if let Some(pattern) = &self.overlay {
            let path = output_path(pattern, label);
            let template = load(&mut self.loaded_template, self.template.as_deref())?;
            let canvas =
                overlay_plot(planned).render(template, &planned.sweep, Some(&planned.trajectory))?;
            canvas
                .save(&path)
                .with_context(|| format!("saving overlay `{}`", path.display()))?;
        }
        if let Some(pattern) = &self.mask {
            let path = output_path(pattern, label);
            let template = load(&mut self.loaded_mask_template, self.mask_template.as_deref())?;
            let mask = template.mask_of(planned.sweep.skull().map(|p| &p.position))?;
            save_mask(&path, &mask, template.header())
                .with_context(|| format!("saving mask `{}`", path.display()))?;
        }
        Ok(())
    }
}

/// 叠加图设置. 切面穿过目标点.
fn overlay_plot(planned: &Planned) -> OverlayPlot {
    OverlayPlot {
        lr_cut: planned.trajectory.target.lr,
        ..OverlayPlot::default()
    }
}

/// 取出已加载的模板, 或从 `path` 加载.
fn load<'a>(
    slot: &'a mut Option<TemplateVolume>,
    path: Option<&Path>,
) -> anyhow::Result<&'a TemplateVolume> {
    if slot.is_none() {
        let path = path.context("no template path configured")?;
        let template = TemplateVolume::open(path)
            .with_context(|| format!("loading template `{}`", path.display()))?;
        log::info!("loaded template `{}` {:?}", path.display(), template.shape());
        *slot = Some(template);
    }
    slot.as_ref().context("template slot is empty")
}

#[cfg(test)]
mod tests {
    use super::{output_path, overlay_plot, plan, PlanRequest, Renderer};
    use std::path::Path;
    use stereo_berry::prelude::*;
    use stereo_berry::{Error, PlanError};

    const CSV: &str = "\
ID,tissue,reference,posteroanterior,superoinferior
s0,skull,bregma,-1.0,0.0
s1,skull,bregma,0.0,0.0
s2,skull,bregma,1.0,0.0
incision,,bregma,0.0,0.1
VTA,brain,s1,0.0,4.0
";

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn request(angle: Option<f64>) -> PlanRequest {
        PlanRequest {
            target: Target::from("VTA"),
            angle: angle.map(|a| InsertionAngle::stereotaxic(a).unwrap()),
            reference: DEFAULT_REFERENCE.to_owned(),
        }
    }

    #[test]
    fn test_plan_by_angle() {
        let sweep = SkullSweep::from_reader(CSV.as_bytes()).unwrap();
        let planned = plan(&sweep, &request(Some(0.0))).unwrap();
        let t = &planned.trajectory;
        assert!(f64_eq(t.target.is, -4.0));
        assert!(f64_eq(t.entry.is, 0.0));
        assert!(f64_eq(t.length, 4.0));
        assert_eq!(t.skull_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_plan_by_incision() {
        let sweep = SkullSweep::from_reader(CSV.as_bytes()).unwrap();
        let planned = plan(&sweep, &request(None)).unwrap();
        let t = &planned.trajectory;
        assert!(f64_eq(t.entry.is, -0.1));
        assert!(f64_eq(t.length, 3.9));
        assert!(t.skull_id.is_none());
    }

    #[test]
    fn test_plan_errors() {
        let csv = "ID,tissue,reference,posteroanterior,superoinferior\nVTA,brain,bregma,0,4\n";
        let sweep = SkullSweep::from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(
            plan(&sweep, &request(None)),
            Err(Error::Plan(PlanError::UnknownTarget(id))) if id == "incision"
        ));
        assert!(matches!(
            plan(&sweep, &request(Some(0.0))),
            Err(Error::Plan(PlanError::NoSkullAbove))
        ));
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("out/plan_{id}.png"), "6465"),
            Path::new("out/plan_6465.png")
        );
        assert_eq!(output_path(Path::new("plan.png"), "6465"), Path::new("plan.png"));
    }

    #[test]
    fn test_render_png() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = SkullSweep::from_reader(CSV.as_bytes()).unwrap();
        let planned = plan(&sweep, &request(Some(0.0))).unwrap();

        let mut renderer = Renderer::new();
        assert!(!renderer.is_active());
        renderer.png = Some(dir.path().join("yz_{id}.png"));
        assert!(renderer.is_active());
        assert!(renderer.is_per_sweep());
        renderer.render(&planned, "a").unwrap();
        assert!(dir.path().join("yz_a.png").is_file());

        // 没有配置模板时无法生成叠加图.
        renderer.overlay = Some(dir.path().join("overlay.png"));
        assert!(!renderer.is_per_sweep());
        assert!(renderer.render(&planned, "a").is_err());
    }

    #[test]
    fn test_render_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = SkullSweep::from_reader(CSV.as_bytes()).unwrap();
        let planned = plan(&sweep, &request(Some(0.0))).unwrap();

        let mut renderer = Renderer::new();
        let missing = dir.path().join("missing");
        renderer.png = Some(missing.join("{id}.png"));
        let err = renderer.render(&planned, "a").unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("saving sagittal plot"), "{text}");
        assert!(text.contains(&missing.join("a.png").display().to_string()), "{text}");
    }

    #[test]
    fn test_overlay_cuts_through_target() {
        let sweep = SkullSweep::from_reader(CSV.as_bytes()).unwrap();
        let mut req = request(Some(0.0));
        req.target = StereoPoint::new(0.0, -4.0, 1.25).into();
        let planned = plan(&sweep, &req).unwrap();
        assert!(f64_eq(overlay_plot(&planned).lr_cut, 1.25));
    }
}

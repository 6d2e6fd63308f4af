//! 规划结果报告.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use stereo_berry::data::ResolvedSweep;
use stereo_berry::Trajectory;

use crate::runner::Planned;

/// 单张表的规划记录.
#[derive(Debug, Serialize)]
struct Entry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trajectory: Option<Trajectory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sweep: Option<ResolvedSweep>,
    /// 规划或输出阶段的错误描述.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// 将 `t` 的结果写进 `w` 中. 每行缩进四个空格.
fn describe_into<W: Write>(name: &str, t: &Trajectory, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Sweep `{name}`:")?;
    for line in t.to_string().lines() {
        writeln!(w, "{S4}{line}")?;
    }
    if let Some(id) = &t.skull_id {
        writeln!(w, "{S4}Skull point: {id}")?;
    }
    Ok(())
}

/// 批量规划的最终结果.
#[derive(Debug, Default)]
pub struct PlanReport {
    data: Vec<Entry>,
}

impl PlanReport {
    /// 记录一张成功规划的表. `output` 为其图像/掩膜输出的结果.
    pub fn push_planned(
        &mut self,
        name: impl Into<String>,
        planned: Planned,
        output: anyhow::Result<()>,
    ) {
        self.data.push(Entry {
            name: name.into(),
            trajectory: Some(planned.trajectory),
            sweep: Some(planned.sweep),
            error: output.err().map(|e| format!("{e:#}")),
        });
    }

    /// 记录一张规划失败的表. 错误只保留其描述.
    pub fn push_failed(&mut self, name: impl Into<String>, e: impl Display) {
        self.data.push(Entry {
            name: name.into(),
            trajectory: None,
            sweep: None,
            error: Some(e.to_string()),
        });
    }

    /// 记录数.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 失败的记录数 (包括输出失败).
    pub fn failures(&self) -> usize {
        self.data.iter().filter(|e| e.error.is_some()).count()
    }

    /// 将全部记录写进 `w` 中, 记录之间以分隔线隔开.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        utils::sep_to(&mut *w)?;
        for e in self.data.iter() {
            match (&e.trajectory, &e.error) {
                (Some(t), None) => describe_into(&e.name, t, w)?,
                (Some(t), Some(err)) => {
                    describe_into(&e.name, t, w)?;
                    writeln!(w, "    Output failed: {err}")?;
                }
                (None, err) => writeln!(
                    w,
                    "Sweep `{}` failed: {}",
                    e.name,
                    err.as_deref().unwrap_or("unknown error")
                )?,
            }
            utils::sep_to(&mut *w)?;
        }
        Ok(())
    }

    /// 输出到标准输出.
    pub fn analyze(&self) -> io::Result<()> {
        let stdout = io::stdout();
        self.write_to(&mut stdout.lock())
    }

    /// 以 JSON 数组形式写进 `w` 中, 包括轨迹和解析后的测量点.
    pub fn write_json<W: Write>(&self, w: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(w, &self.data)
    }

    /// 保存为 JSON 文件.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("creating report `{}`", path.display()))?;
        let mut w = BufWriter::new(file);
        self.write_json(&mut w)
            .with_context(|| format!("writing report `{}`", path.display()))?;
        w.flush()?;
        log::info!("saved {} record(s) to `{}`", self.len(), path.display());
        Ok(())
    }
}

//! 🧭欢迎光临🦴
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Idx3dF};

pub use crate::data::{
    resolve_reference_frame, ResolvedPoint, ResolvedSweep, SkullSweep, StereoPoint, SweepRecord,
    Tissue,
};

pub use crate::trajectory::{
    implant_length, project_target, AngleConvention, InsertionAngle, Target, Trajectory,
};

pub use crate::render::{
    make_mask, save_mask, ImgWriteVis, IntensityWindow, NiftiHeaderAttr, OverlayPlot,
    TemplateVolume, YzPlot,
};

pub use crate::consts::{DEFAULT_REFERENCE, INCISION_ID};

pub use crate::dataset::{self, home_dir_with, sweep_loader};

pub use crate::{Error, Result};

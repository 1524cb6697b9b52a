use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Inferred,
    Reused,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxMsg {
    // normalized 0..1, center form
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub confidence: f32,
    pub class_id: u32,
}

/// One line of `spot replay` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameEvent {
    pub ts_unix_ms: i64,
    pub tick: u64,
    pub sample: SampleKind,
    pub fresh: bool,
    pub detection: Option<BoxMsg>,
    // pixel rect on the canvas: left, top, width, height
    pub screen: Option<[u32; 4]>,
}

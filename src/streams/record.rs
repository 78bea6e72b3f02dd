use serde::{Deserialize, Serialize};

/// Persisted part of a stream, read-only from the gateway's side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub id: String,
    #[serde(rename = "streamUrl")]
    pub stream_url: String,
    #[serde(default)]
    pub captions: Captions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captions {
    #[serde(default)]
    pub vtt: CaptionTrack,
    #[serde(default)]
    pub scc: CaptionTrack,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    #[serde(default)]
    pub en: String,
}

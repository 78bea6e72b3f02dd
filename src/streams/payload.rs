use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Serializer, Value};

use crate::streams::record::{Captions, StreamRecord};

const CAPTIONS_KEY: &str = "captions";

/// Field order is part of the wire contract: id, streamUrl, captions, ads.
#[derive(Serialize)]
struct Payload<'a> {
    id: &'a str,
    #[serde(rename = "streamUrl")]
    stream_url: &'a str,
    captions: &'a Captions,
    ads: &'a Value,
}

/// Render the client payload for `record` merged with its ad metadata.
///
/// Two-space indented JSON. Forward slashes are written as `\/` inside the
/// `captions` subtree and nowhere else.
pub fn render(record: &StreamRecord, ads: &Value) -> serde_json::Result<Vec<u8>> {
    let payload = Payload {
        id: &record.id,
        stream_url: &record.stream_url,
        captions: &record.captions,
        ads,
    };

    let mut out = Vec::with_capacity(1024);
    let mut ser = Serializer::with_formatter(&mut out, CaptionEscaper::new());
    payload.serialize(&mut ser)?;
    Ok(out)
}

/// Pretty formatter that knows which object key every string value sits
/// under and escapes slashes only below `captions`.
struct CaptionEscaper {
    inner: PrettyFormatter<'static>,
    path: Vec<String>,
    key: Option<String>,
}

impl CaptionEscaper {
    fn new() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(b"  "),
            path: Vec::new(),
            key: None,
        }
    }

    fn in_captions(&self) -> bool {
        self.path.first().is_some_and(|top| top == CAPTIONS_KEY)
    }
}

impl Formatter for CaptionEscaper {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.key = Some(String::new());
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let key = self.key.take().unwrap_or_default();
        self.path.push(key);
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.path.pop();
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        if let Some(key) = self.key.as_mut() {
            key.push_str(fragment);
            return writer.write_all(fragment.as_bytes());
        }
        if self.in_captions() && fragment.contains('/') {
            return writer.write_all(fragment.replace('/', "\\/").as_bytes());
        }
        writer.write_all(fragment.as_bytes())
    }
}

use netcam_protocol::{FourCC, FramePayload};

/// A frame as handed to callers: an opaque byte buffer plus what the device
/// said about it. Check `ok()` before looking at the bytes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    ok: bool,
    width: usize,
    height: usize,
    format: FourCC,
    data: Vec<u8>,
}

impl Frame {
    pub fn new<B: Into<Vec<u8>>>(data: B, width: usize, height: usize, format: FourCC) -> Frame {
        Frame {
            ok: true,
            width,
            height,
            format,
            data: data.into(),
        }
    }

    /// The "nothing captured" frame returned with a failed read.
    pub fn empty() -> Frame {
        Frame::default()
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> FourCC {
        self.format
    }

    /// Transferred size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl From<FramePayload> for Frame {
    fn from(payload: FramePayload) -> Frame {
        // a failed frame never exposes whatever bytes came with it
        if !payload.ok {
            return Frame::empty();
        }
        Frame {
            ok: true,
            width: payload.width as usize,
            height: payload.height as usize,
            format: payload.format,
            data: payload.data,
        }
    }
}

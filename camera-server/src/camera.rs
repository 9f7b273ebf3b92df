use netcam_protocol::{Command, FourCC, FramePayload, PropertyId, Request, Response};

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use tracing::{debug, trace};

const MAX_DIMENSION: f64 = 8192.0;

/// An in-memory camera that answers protocol requests.
///
/// Properties live in a table seeded with plausible defaults; only ids in the
/// table can be read or written. Frames are generated, sized for the current
/// resolution and format, and carry a counter so consecutive frames differ.
#[derive(Clone, Debug)]
pub struct SimulatedCamera {
    opened: bool,
    properties: BTreeMap<PropertyId, f64>,
    unsupported: BTreeSet<PropertyId>,
    frames: u64,
    frame_limit: Option<u64>,
    frame_delay: Duration,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        SimulatedCamera::new()
    }
}

impl SimulatedCamera {
    pub fn new() -> SimulatedCamera {
        let properties = BTreeMap::from([
            (PropertyId::FRAME_WIDTH, 640.0),
            (PropertyId::FRAME_HEIGHT, 480.0),
            (PropertyId::FPS, 30.0),
            (PropertyId::FOURCC, FourCC::YUYV.as_value()),
            (PropertyId::POS_FRAMES, 0.0),
            (PropertyId::BRIGHTNESS, 0.5),
            (PropertyId::CONTRAST, 0.5),
            (PropertyId::SATURATION, 0.5),
            (PropertyId::GAIN, 0.0),
            (PropertyId::EXPOSURE, -6.0),
            (PropertyId::AUTO_EXPOSURE, 0.75),
            (PropertyId::FOCUS, 0.0),
            (PropertyId::AUTOFOCUS, 1.0),
            (PropertyId::BUFFERSIZE, 4.0),
        ]);
        SimulatedCamera {
            opened: false,
            properties,
            unsupported: BTreeSet::new(),
            frames: 0,
            frame_limit: None,
            frame_delay: Duration::ZERO,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.properties.insert(PropertyId::FRAME_WIDTH, width as f64);
        self.properties.insert(PropertyId::FRAME_HEIGHT, height as f64);
        self
    }

    pub fn with_format(mut self, format: FourCC) -> Self {
        self.properties.insert(PropertyId::FOURCC, format.as_value());
        self
    }

    /// Makes the camera refuse reads and writes of `property`.
    pub fn with_unsupported(mut self, property: PropertyId) -> Self {
        self.unsupported.insert(property);
        self
    }

    /// Sleeps this long before answering each frame read, to mimic a stalled
    /// device.
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// Ends the stream after `limit` frames; later reads report no frame.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    pub fn frames_served(&self) -> u64 {
        self.frames
    }

    pub fn property(&self, property: PropertyId) -> Option<f64> {
        if self.unsupported.contains(&property) {
            return None;
        }
        self.properties.get(&property).copied()
    }

    pub fn handle(&mut self, request: &Request) -> Response {
        trace!(?request, "handling");
        match *request {
            Request::Ping => Response::ack(true),
            Request::Open => {
                self.opened = true;
                Response::ack(true)
            }
            Request::IsOpened => Response::opened(self.opened),
            Request::Get { property } => match self.property(property) {
                Some(value) => Response::value(true, value),
                None => Response::failure(Command::GetProp),
            },
            Request::Set { property, value } => Response::ack(self.set(property, value)),
            Request::ReadFrame => Response::frame(self.capture()),
            Request::Release => {
                self.opened = false;
                Response::ack(true)
            }
        }
    }

    fn set(&mut self, property: PropertyId, value: f64) -> bool {
        if self.unsupported.contains(&property) || !self.properties.contains_key(&property) {
            debug!(%property, "set on unsupported property");
            return false;
        }
        let value = property.kind().normalize(value);
        let valid = match property {
            PropertyId::FRAME_WIDTH | PropertyId::FRAME_HEIGHT => value >= 1.0 && value <= MAX_DIMENSION,
            PropertyId::FPS => value > 0.0,
            PropertyId::FOURCC => FourCC::from_value(value).is_some_and(is_known_format),
            _ => value.is_finite(),
        };
        if !valid {
            debug!(%property, value, "value out of range");
            return false;
        }
        self.properties.insert(property, value);
        true
    }

    fn dimension(&self, property: PropertyId) -> u32 {
        self.properties.get(&property).copied().unwrap_or(0.0) as u32
    }

    fn format(&self) -> FourCC {
        self.properties
            .get(&PropertyId::FOURCC)
            .and_then(|v| FourCC::from_value(*v))
            .unwrap_or(FourCC::YUYV)
    }

    fn capture(&mut self) -> FramePayload {
        if !self.opened {
            debug!("frame requested while closed");
            return FramePayload::empty();
        }
        if self.frame_limit.is_some_and(|limit| self.frames >= limit) {
            return FramePayload::empty();
        }

        let width = self.dimension(PropertyId::FRAME_WIDTH);
        let height = self.dimension(PropertyId::FRAME_HEIGHT);
        let format = self.format();
        let pixels = width as usize * height as usize;
        let size = match bytes_per_pixel(format) {
            Some(bpp) => pixels * bpp,
            // compressed formats come out much smaller than raw
            None => pixels / 10,
        };

        let seed = self.frames as usize;
        let data = (0..size).map(|i| (i + seed) as u8).collect();
        self.frames += 1;
        self.properties.insert(PropertyId::POS_FRAMES, self.frames as f64);

        FramePayload {
            ok: true,
            width,
            height,
            format,
            data,
        }
    }
}

fn bytes_per_pixel(format: FourCC) -> Option<usize> {
    match format {
        FourCC::YUYV => Some(2),
        FourCC::RGB3 => Some(3),
        _ => None,
    }
}

fn is_known_format(format: FourCC) -> bool {
    matches!(format, FourCC::YUYV | FourCC::RGB3 | FourCC::MJPG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcam_protocol::Payload;

    fn frame_of(response: Response) -> FramePayload {
        match response.payload {
            Payload::Frame(frame) => frame,
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn open_and_release_toggle_state() {
        let mut camera = SimulatedCamera::new();
        assert_eq!(camera.handle(&Request::IsOpened), Response::opened(false));
        assert!(camera.handle(&Request::Open).ok);
        assert_eq!(camera.handle(&Request::IsOpened), Response::opened(true));
        assert!(camera.handle(&Request::Release).ok);
        assert!(!camera.is_opened());
        // releasing twice is harmless
        assert!(camera.handle(&Request::Release).ok);
    }

    #[test]
    fn frames_follow_resolution_and_format() {
        let mut camera = SimulatedCamera::new();
        camera.handle(&Request::Open);

        let frame = frame_of(camera.handle(&Request::ReadFrame));
        assert!(frame.ok);
        assert_eq!((frame.width, frame.height), (640, 480));
        assert_eq!(frame.format, FourCC::YUYV);
        assert_eq!(frame.size(), 640 * 480 * 2);

        let set = |camera: &mut SimulatedCamera, property, value| {
            camera.handle(&Request::Set { property, value }).ok
        };
        assert!(set(&mut camera, PropertyId::FRAME_WIDTH, 320.0));
        assert!(set(&mut camera, PropertyId::FRAME_HEIGHT, 240.0));
        assert!(set(&mut camera, PropertyId::FOURCC, FourCC::RGB3.as_value()));
        let frame = frame_of(camera.handle(&Request::ReadFrame));
        assert_eq!(frame.size(), 320 * 240 * 3);
        assert_eq!(camera.property(PropertyId::POS_FRAMES), Some(2.0));
    }

    #[test]
    fn closed_camera_has_no_frame() {
        let mut camera = SimulatedCamera::new();
        let response = camera.handle(&Request::ReadFrame);
        assert!(!response.ok);
        assert!(frame_of(response).data.is_empty());
        assert_eq!(camera.frames_served(), 0);
    }

    #[test]
    fn stream_ends_at_the_limit() {
        let mut camera = SimulatedCamera::new().with_size(4, 4).with_frame_limit(2);
        camera.handle(&Request::Open);
        assert!(camera.handle(&Request::ReadFrame).ok);
        assert!(camera.handle(&Request::ReadFrame).ok);
        assert!(!camera.handle(&Request::ReadFrame).ok);
    }

    #[test]
    fn set_values_read_back_normalized() {
        let mut camera = SimulatedCamera::new();
        assert!(camera.handle(&Request::Set { property: PropertyId::AUTOFOCUS, value: 0.0 }).ok);
        assert_eq!(camera.handle(&Request::Get { property: PropertyId::AUTOFOCUS }), Response::value(true, 0.0));

        assert!(camera.handle(&Request::Set { property: PropertyId::FRAME_WIDTH, value: 1279.6 }).ok);
        assert_eq!(camera.property(PropertyId::FRAME_WIDTH), Some(1280.0));
    }

    #[test]
    fn bad_values_leave_state_alone() {
        let mut camera = SimulatedCamera::new();
        assert!(!camera.handle(&Request::Set { property: PropertyId::FRAME_WIDTH, value: 0.0 }).ok);
        assert!(!camera.handle(&Request::Set { property: PropertyId::FPS, value: -1.0 }).ok);
        assert!(!camera.handle(&Request::Set { property: PropertyId::FOURCC, value: 0.0 }).ok);
        assert_eq!(camera.property(PropertyId::FRAME_WIDTH), Some(640.0));
        assert_eq!(camera.property(PropertyId::FPS), Some(30.0));
        assert_eq!(camera.property(PropertyId::FOURCC), Some(FourCC::YUYV.as_value()));
    }

    #[test]
    fn unsupported_properties_are_refused() {
        let mut camera = SimulatedCamera::new().with_unsupported(PropertyId::AUTOFOCUS);
        assert_eq!(
            camera.handle(&Request::Get { property: PropertyId::AUTOFOCUS }),
            Response::value(false, 0.0)
        );
        assert!(!camera.handle(&Request::Set { property: PropertyId::AUTOFOCUS, value: 1.0 }).ok);

        // ids the camera never heard of are unsupported too
        let unknown = PropertyId(77);
        assert!(!camera.handle(&Request::Get { property: unknown }).ok);
        assert!(!camera.handle(&Request::Set { property: unknown, value: 1.0 }).ok);
        assert_eq!(camera.property(unknown), None);
    }
}

//! Camera tilt playback.
//!
//! The locomotion core only asks for tilts. This is where a request is turned
//! into an orientation offset that eases toward its target over time.

use glam::Vec3;
use momentum_physics::{LocomotionEvent, TiltRequest};

/// Runtime camera tilt state.
///
/// Angles are local `(pitch, yaw, roll)` offsets in degrees.
#[derive(Debug, Clone, Default)]
pub struct CameraTilt {
    /// Offset when the active request began.
    start: Vec3,

    /// Request being played back.
    active: Option<TiltRequest>,

    /// Seconds since the active request began.
    elapsed: f32,
}

impl CameraTilt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin easing from the current offset toward `request`.
    ///
    /// A newer request replaces one still in progress without a jump.
    pub fn request(&mut self, request: TiltRequest) {
        self.start = self.current();
        self.active = Some(request);
        self.elapsed = 0.0;
    }

    /// Start playback of every tilt among `events`. The last one wins.
    pub fn handle_events(&mut self, events: &[LocomotionEvent]) {
        for event in events {
            if let LocomotionEvent::CameraTilt(request) = event {
                self.request(*request);
            }
        }
    }

    /// Advance playback by `delta_time` seconds.
    pub fn update(&mut self, delta_time: f32) {
        let Some(request) = self.active else {
            return;
        };

        self.elapsed += delta_time;
        if self.elapsed >= request.duration {
            self.start = target(&request);
            self.active = None;
            self.elapsed = 0.0;
        }
    }

    /// Current `(pitch, yaw, roll)` offset in degrees.
    pub fn current(&self) -> Vec3 {
        let Some(request) = self.active else {
            return self.start;
        };

        let t = if request.duration > 0.0 {
            self.elapsed / request.duration
        } else {
            1.0
        };
        self.start.lerp(target(&request), request.easing.apply(t))
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }
}

fn target(request: &TiltRequest) -> Vec3 {
    Vec3::new(request.pitch, request.yaw, request.roll)
}

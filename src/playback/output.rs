//! The seam between the controller and the platform's media element.

/// Control surface of the single media-playback object a controller owns.
/// Only the controller calls these.
pub trait OutputHandle {
    fn load(&mut self, src: &str);
    /// Drops the current source so the handle holds nothing.
    fn unload(&mut self);
    fn has_source(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, secs: f64);
    /// `None` until metadata is loaded, or for streams without a length.
    fn duration(&self) -> Option<f64>;
}

/// Events emitted by the media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    TimeUpdate,
    Play,
    Pause,
    Ended,
    LoadedMetadata,
    /// Carries the `MediaError.code` reported by the element, 0 when unknown.
    Error(u16),
}

/// Human readable reason for a `MediaError` code, for diagnostics.
pub fn describe_media_error(code: u16) -> &'static str {
    match code {
        1 => "playback was aborted before the source loaded",
        2 => "network error while loading the source",
        3 => "the source could not be decoded",
        4 => "no supported source was found",
        _ => "unable to load this audio source",
    }
}

/// Filters out NaN, infinite and non-positive lengths.
pub fn usable_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

#[cfg(test)]
pub(crate) mod mock {
    use super::OutputHandle;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    pub struct HandleState {
        pub src: Option<String>,
        pub playing: bool,
        pub current_time: f64,
        pub duration: Option<f64>,
        pub calls: Vec<String>,
    }

    /// Records every call; tests keep a clone to inspect and drive it.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingHandle {
        pub state: Rc<RefCell<HandleState>>,
    }

    impl RecordingHandle {
        pub fn set_time(&self, current_time: f64, duration: Option<f64>) {
            let mut state = self.state.borrow_mut();
            state.current_time = current_time;
            state.duration = duration;
        }

        pub fn src(&self) -> Option<String> {
            self.state.borrow().src.clone()
        }

        pub fn current_time(&self) -> f64 {
            self.state.borrow().current_time
        }

        pub fn calls(&self) -> Vec<String> {
            self.state.borrow().calls.clone()
        }

        pub fn last_call(&self) -> Option<String> {
            self.state.borrow().calls.last().cloned()
        }
    }

    impl OutputHandle for RecordingHandle {
        fn load(&mut self, src: &str) {
            let mut state = self.state.borrow_mut();
            state.src = Some(src.to_string());
            state.current_time = 0.0;
            state.duration = None;
            state.calls.push(format!("load {src}"));
        }

        fn unload(&mut self) {
            let mut state = self.state.borrow_mut();
            state.src = None;
            state.duration = None;
            state.calls.push("unload".to_string());
        }

        fn has_source(&self) -> bool {
            self.state.borrow().src.is_some()
        }

        fn play(&mut self) {
            let mut state = self.state.borrow_mut();
            state.playing = true;
            state.calls.push("play".to_string());
        }

        fn pause(&mut self) {
            let mut state = self.state.borrow_mut();
            state.playing = false;
            state.calls.push("pause".to_string());
        }

        fn current_time(&self) -> f64 {
            self.state.borrow().current_time
        }

        fn set_current_time(&mut self, secs: f64) {
            let mut state = self.state.borrow_mut();
            state.current_time = secs;
            state.calls.push(format!("seek {secs}"));
        }

        fn duration(&self) -> Option<f64> {
            self.state.borrow().duration
        }
    }
}

// Browser audio element backend and its event wiring.
use crate::playback::{usable_duration, MediaEvent, OutputHandle, PlaybackController};
use dioxus::core::{Runtime, RuntimeGuard};
use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{window, HtmlAudioElement};

/// Initialize the hidden audio element once.
pub fn get_or_create_audio_element(id: &str) -> Option<HtmlAudioElement> {
    let document = window()?.document()?;

    if let Some(existing) = document.get_element_by_id(id) {
        return existing.dyn_into::<HtmlAudioElement>().ok();
    }

    let audio: HtmlAudioElement = document.create_element("audio").ok()?.dyn_into().ok()?;
    audio.set_id(id);
    // Keep preload light so we stream instead of buffering entire files
    audio.set_attribute("preload", "metadata").ok()?;
    document.body()?.append_child(&audio).ok()?;

    Some(audio)
}

fn web_try_play(audio: &HtmlAudioElement) {
    if let Ok(promise) = audio.play() {
        wasm_bindgen_futures::spawn_local(async move {
            // Rejections (autoplay policy, bad source) surface as "nothing plays".
            if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                debug!(error = ?err, "play() was rejected");
            }
        });
    }
}

pub struct WebAudioOutput {
    audio: HtmlAudioElement,
}

impl WebAudioOutput {
    pub fn new(audio: HtmlAudioElement) -> Self {
        Self { audio }
    }
}

impl OutputHandle for WebAudioOutput {
    fn load(&mut self, src: &str) {
        self.audio.set_src(src);
    }

    fn unload(&mut self) {
        let _ = self.audio.remove_attribute("src");
        self.audio.load();
    }

    fn has_source(&self) -> bool {
        self.audio
            .get_attribute("src")
            .is_some_and(|src| !src.trim().is_empty())
    }

    fn play(&mut self) {
        web_try_play(&self.audio);
    }

    fn pause(&mut self) {
        let _ = self.audio.pause();
    }

    fn current_time(&self) -> f64 {
        self.audio.current_time()
    }

    fn set_current_time(&mut self, secs: f64) {
        self.audio.set_current_time(secs);
    }

    fn duration(&self) -> Option<f64> {
        usable_duration(self.audio.duration())
    }
}

/// Forwards the element's events to the controller.
///
/// Each event is delivered from a microtask, so it never lands inside a
/// controller operation that is still running.
pub fn attach_media_events(audio: &HtmlAudioElement, controller: &PlaybackController) {
    let runtime = Runtime::current();
    let events = [
        ("timeupdate", Some(MediaEvent::TimeUpdate)),
        ("play", Some(MediaEvent::Play)),
        ("pause", Some(MediaEvent::Pause)),
        ("ended", Some(MediaEvent::Ended)),
        ("loadedmetadata", Some(MediaEvent::LoadedMetadata)),
        ("error", None),
    ];

    for (name, event) in events {
        let runtime = runtime.clone();
        let controller = controller.clone();
        let element = audio.clone();
        let callback = Closure::wrap(Box::new(move || {
            let event = event.unwrap_or_else(|| {
                MediaEvent::Error(element.error().map(|e| e.code()).unwrap_or(0))
            });
            let runtime = runtime.clone();
            let controller = controller.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let _guard = RuntimeGuard::new(runtime);
                controller.handle_media_event(event);
            });
        }) as Box<dyn FnMut()>);
        let _ = audio.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
        callback.forget();
    }
}

//! Effect runtime for the session reducer.
//!
//! The runtime owns the [`SessionState`] and is driven from one thread. It
//! applies actions through [`reduce`] and turns the returned effects into
//! tokio tasks. Tasks never touch the state: they sleep or call the photo
//! library and then send a [`RuntimeAction`] back over a channel, which the
//! owner feeds through [`SessionRuntime::drain`] or
//! [`SessionRuntime::next_event`].
//!
//! Cancellation is cooperative. A cancelled task still wakes up and reports;
//! the reducer decides from the attempt or toast id whether the report is
//! still current.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::watch;

use fytlo_core::actions::RuntimeAction;
use fytlo_core::actions::SessionAction;
use fytlo_core::config::Config;
use fytlo_core::persistence::load_auto_save_preference;
use fytlo_core::persistence::store_auto_save_preference;
use fytlo_core::persistence::PreferenceStore;
use fytlo_core::reducer::reduce;
use fytlo_core::reducer::FytloEffect;
use fytlo_core::state::AttemptId;
use fytlo_core::state::ImageHandle;
use fytlo_core::state::SaveId;
use fytlo_core::state::SessionState;
use fytlo_core::state::ToastId;

use crate::contracts::PhotoLibrary;

#[derive(Debug, Clone, Default)]
struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct SessionRuntime {
    state: SessionState,
    store: Box<dyn PreferenceStore + Send>,
    library: Arc<dyn PhotoLibrary>,
    handle: Handle,
    tx: mpsc::UnboundedSender<RuntimeAction>,
    rx: mpsc::UnboundedReceiver<RuntimeAction>,
    generations: HashMap<AttemptId, CancelFlag>,
    toast_timer: Option<CancelFlag>,
    snapshots: watch::Sender<SessionState>,
    frame_requested: bool,
}

impl SessionRuntime {
    /// Restores the auto-save preference from `store` and starts on the
    /// welcome route.
    pub fn new(
        config: Config,
        store: Box<dyn PreferenceStore + Send>,
        library: Arc<dyn PhotoLibrary>,
        handle: Handle,
    ) -> Self {
        let preference = load_auto_save_preference(store.as_ref());
        tracing::info!(preference = preference.label(), "session created");
        let state = SessionState::new(config, preference);
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            state,
            store,
            library,
            handle,
            tx,
            rx,
            generations: HashMap::new(),
            toast_timer: None,
            snapshots,
            frame_requested: true,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Observers get a fresh snapshot after every applied action.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshots.subscribe()
    }

    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }

    pub fn in_flight_generations(&self) -> usize {
        self.generations.len()
    }

    pub fn dispatch(&mut self, action: impl Into<SessionAction>) {
        let action = action.into();
        if let SessionAction::Runtime(RuntimeAction::GenerationWoke { attempt, .. }) = &action {
            self.generations.remove(attempt);
        }
        let effects = reduce(&mut self.state, action);
        for effect in effects {
            self.execute(effect);
        }
        self.snapshots.send_replace(self.state.clone());
    }

    /// Applies every runtime report already queued. Never blocks.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.rx.try_recv() {
            self.dispatch(action);
            applied += 1;
        }
        applied
    }

    /// Waits for the next runtime report and applies it.
    pub async fn next_event(&mut self) -> bool {
        match self.rx.recv().await {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    fn execute(&mut self, effect: FytloEffect) {
        match effect {
            FytloEffect::RequestFrame => self.frame_requested = true,
            FytloEffect::StartGeneration { attempt } => self.start_generation(attempt),
            FytloEffect::CancelGeneration { attempt } => {
                if let Some(flag) = self.generations.get(&attempt) {
                    flag.cancel();
                }
            }
            FytloEffect::ScheduleToastHide { id, after } => self.schedule_toast_hide(id, after),
            FytloEffect::CancelToastHide => {
                if let Some(flag) = self.toast_timer.take() {
                    flag.cancel();
                }
            }
            FytloEffect::PersistAutoSavePreference(preference) => {
                if let Err(err) = store_auto_save_preference(self.store.as_mut(), preference) {
                    tracing::warn!(error = %err, "failed to persist auto-save preference");
                }
            }
            FytloEffect::CheckPhotoAuthorization { save, image } => {
                self.check_authorization(save, image)
            }
            FytloEffect::RequestPhotoAuthorization { save, image } => {
                self.request_authorization(save, image)
            }
            FytloEffect::WritePhoto { save, image } => self.write_photo(save, image),
        }
    }

    fn generation_delay(&self) -> Duration {
        let (min, max) = self.state.config.generation.delay_range();
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn start_generation(&mut self, attempt: AttemptId) {
        let delay = self.generation_delay();
        let flag = CancelFlag::default();
        self.generations.insert(attempt, flag.clone());
        let tx = self.tx.clone();
        tracing::debug!(
            attempt = attempt.0,
            delay_ms = delay.as_millis() as u64,
            "generation scheduled"
        );
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RuntimeAction::GenerationWoke {
                attempt,
                cancelled: flag.is_cancelled(),
            });
        });
    }

    fn schedule_toast_hide(&mut self, id: ToastId, after: Duration) {
        if let Some(previous) = self.toast_timer.take() {
            previous.cancel();
        }
        let flag = CancelFlag::default();
        self.toast_timer = Some(flag.clone());
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(after).await;
            if !flag.is_cancelled() {
                let _ = tx.send(RuntimeAction::ToastExpired { id });
            }
        });
    }

    fn check_authorization(&self, save: SaveId, image: ImageHandle) {
        let library = Arc::clone(&self.library);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let status = library.authorization_status().await;
            let _ = tx.send(RuntimeAction::PhotoAuthorizationChecked {
                save,
                status,
                image,
            });
        });
    }

    fn request_authorization(&self, save: SaveId, image: ImageHandle) {
        let library = Arc::clone(&self.library);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let status = library.request_authorization().await;
            let _ = tx.send(RuntimeAction::PhotoAuthorizationRequested {
                save,
                status,
                image,
            });
        });
    }

    fn write_photo(&self, save: SaveId, image: ImageHandle) {
        let library = Arc::clone(&self.library);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let success = match library.write(&image).await {
                Ok(stored) => {
                    tracing::info!(path = %stored.display(), "result saved to photo library");
                    true
                }
                Err(err) => {
                    tracing::warn!(error = %err, "saving result failed");
                    false
                }
            };
            let _ = tx.send(RuntimeAction::PhotoWriteFinished { save, success });
        });
    }
}

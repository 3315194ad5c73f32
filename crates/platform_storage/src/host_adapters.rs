use std::rc::Rc;

use futures::task::LocalSpawn;
use platform_host_web::{build_host_services, HostServices};

use crate::schedule::MirrorTimer;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::time::Duration;

    use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;

    use crate::schedule::{MirrorTimer, TimerFuture};

    #[derive(Debug, Clone, Copy, Default)]
    /// Spawns local futures on the browser microtask queue.
    pub struct WasmSpawner;

    impl LocalSpawn for WasmSpawner {
        fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
            wasm_bindgen_futures::spawn_local(future);
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default)]
    /// `setTimeout`-backed timer.
    pub struct BrowserTimer;

    impl MirrorTimer for BrowserTimer {
        fn sleep(&self, delay: Duration) -> TimerFuture {
            let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                let armed = web_sys::window().and_then(|window| {
                    window
                        .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                        .ok()
                });
                if armed.is_none() {
                    let _ = resolve.call0(&JsValue::NULL);
                }
            });
            Box::pin(async move {
                let _ = JsFuture::from(promise).await;
            })
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{BrowserTimer, WasmSpawner};

/// Executor for background storage work in the current build.
pub(crate) fn local_spawner() -> Rc<dyn LocalSpawn> {
    #[cfg(target_arch = "wasm32")]
    {
        Rc::new(WasmSpawner)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Rc::new(crate::schedule::NoopSpawner)
    }
}

/// Timer for debounced mirrors in the current build.
pub(crate) fn mirror_timer() -> Rc<dyn MirrorTimer> {
    #[cfg(target_arch = "wasm32")]
    {
        Rc::new(BrowserTimer)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Rc::new(crate::schedule::ManualTimer::default())
    }
}

pub(crate) fn host_services() -> HostServices {
    build_host_services()
}

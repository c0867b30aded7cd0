use std::{cell::RefCell, rc::Rc};

use web_sys::{
    wasm_bindgen::{prelude::Closure, JsCast},
    Window,
};

use crate::{error::Error, utils::get_window};

/// Schedules the engine's frame callback.
///
/// The engine keeps at most one frame outstanding: it requests a frame when
/// the first particle appears and again at the end of every tick that leaves
/// particles alive. The host calls [`ParticleEngine::tick`] when the frame
/// fires.
///
/// [`ParticleEngine::tick`]: super::ParticleEngine::tick
pub trait FrameScheduler {
    /// Requests one frame. Does nothing if a frame is already pending.
    fn request_frame(&mut self);

    /// Cancels the pending frame, if any.
    fn cancel_frame(&mut self);

    /// Marks the pending frame as delivered.
    ///
    /// Called by the engine at the start of every tick.
    fn frame_delivered(&mut self);

    /// Returns whether a frame is pending.
    fn is_pending(&self) -> bool;
}

/// A scheduler driven by hand.
///
/// Useful when the host owns the frame loop (or in tests): check
/// [`ManualScheduler::is_pending`] and call `tick` yourself.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    pending: bool,
    requests: usize,
    cancellations: usize,
}

impl ManualScheduler {
    /// Constructs a new [`ManualScheduler`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames requested so far.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Number of pending frames cancelled so far.
    pub fn cancellations(&self) -> usize {
        self.cancellations
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        if !self.pending {
            self.pending = true;
            self.requests += 1;
        }
    }

    fn cancel_frame(&mut self) {
        if self.pending {
            self.pending = false;
            self.cancellations += 1;
        }
    }

    fn frame_delivered(&mut self) {
        self.pending = false;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Shared slot holding the frame callback.
type CallbackSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// A scheduler backed by [`requestAnimationFrame`].
///
/// The callback is installed after construction with
/// [`AnimationFrameScheduler::set_callback`], because it usually needs a
/// handle to the engine that owns this scheduler.
///
/// [`requestAnimationFrame`]: https://developer.mozilla.org/en-US/docs/Web/API/Window/requestAnimationFrame
#[derive(Debug)]
pub struct AnimationFrameScheduler {
    /// Window used to request frames.
    window: Window,
    /// Frame callback.
    callback: CallbackSlot,
    /// Handle of the pending request.
    pending: Option<i32>,
}

impl AnimationFrameScheduler {
    /// Constructs a new [`AnimationFrameScheduler`] without a callback.
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            window: get_window()?,
            callback: Rc::new(RefCell::new(None)),
            pending: None,
        })
    }

    /// Sets the function invoked on every requested frame.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: FnMut() + 'static,
    {
        *self.callback.borrow_mut() = Some(Closure::wrap(Box::new(callback) as Box<dyn FnMut()>));
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) {
        if self.pending.is_some() {
            return;
        }
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            log::warn!("frame requested before a callback was set");
            return;
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(handle) => self.pending = Some(handle),
            Err(err) => log::warn!("requestAnimationFrame failed: {err:?}"),
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending.take() {
            let _ = self.window.cancel_animation_frame(handle);
        }
    }

    fn frame_delivered(&mut self) {
        self.pending = None;
    }

    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for AnimationFrameScheduler {
    fn drop(&mut self) {
        self.cancel_frame();
    }
}

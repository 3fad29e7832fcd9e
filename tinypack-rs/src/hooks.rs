//! Named lifecycle hooks plugins attach synchronous callbacks to.

use log::debug;
use std::fmt;

use crate::error::{BundleError, Result};

/// Points in a build at which taps are called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Before anything is read.
    Run,
    /// After all assets are rendered, before any is written.
    Emit,
    /// After every asset has been written.
    Done,
}

impl HookPoint {
    pub const ALL: [HookPoint; 3] = [HookPoint::Run, HookPoint::Emit, HookPoint::Done];

    pub fn name(&self) -> &'static str {
        match self {
            HookPoint::Run => "run",
            HookPoint::Emit => "emit",
            HookPoint::Done => "done",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Callback = Box<dyn FnMut() -> anyhow::Result<()>>;

struct Tap {
    name: String,
    callback: Callback,
}

/// One ordered list of taps per [`HookPoint`].
#[derive(Default)]
pub struct Hooks {
    run: Vec<Tap>,
    emit: Vec<Tap>,
    done: Vec<Tap>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `name`. Taps are called in registration order.
    pub fn tap<F>(&mut self, point: HookPoint, name: impl Into<String>, callback: F)
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.taps_mut(point).push(Tap {
            name: name.into(),
            callback: Box::new(callback),
        });
    }

    /// Names of the taps registered at `point`.
    pub fn tap_names(&self, point: HookPoint) -> Vec<&str> {
        self.taps(point).iter().map(|tap| tap.name.as_str()).collect()
    }

    /// Calls every tap at `point`. The first failing tap aborts the call.
    pub fn call(&mut self, point: HookPoint) -> Result<()> {
        for tap in self.taps_mut(point) {
            debug!("calling {} tap '{}'", point, tap.name);
            (tap.callback)().map_err(|source| BundleError::Hook {
                hook: point,
                tap: tap.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn taps(&self, point: HookPoint) -> &Vec<Tap> {
        match point {
            HookPoint::Run => &self.run,
            HookPoint::Emit => &self.emit,
            HookPoint::Done => &self.done,
        }
    }

    fn taps_mut(&mut self, point: HookPoint) -> &mut Vec<Tap> {
        match point {
            HookPoint::Run => &mut self.run,
            HookPoint::Emit => &mut self.emit,
            HookPoint::Done => &mut self.done,
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for point in HookPoint::ALL {
            map.entry(&point.name(), &self.tap_names(point));
        }
        map.finish()
    }
}

//! Plugin extension point.

use log::info;

use crate::error::{BundleError, Result};
use crate::hooks::{HookPoint, Hooks};

/// A plugin registers taps on the build's [`Hooks`] before the build starts.
pub trait Plugin {
    fn name(&self) -> &str;

    fn apply(&self, hooks: &mut Hooks);
}

/// Logs each lifecycle point at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingPlugin;

impl Plugin for LoggingPlugin {
    fn name(&self) -> &str {
        "logging"
    }

    fn apply(&self, hooks: &mut Hooks) {
        for point in HookPoint::ALL {
            hooks.tap(point, self.name(), move || {
                info!("tinypack {}", point);
                Ok(())
            });
        }
    }
}

/// Looks up a built-in plugin by the name used in config files.
pub fn builtin_plugin(name: &str) -> Result<Box<dyn Plugin>> {
    match name {
        "logging" => Ok(Box::new(LoggingPlugin)),
        other => Err(BundleError::config(format!("unknown plugin '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_plugin_taps_every_point() {
        let mut hooks = Hooks::new();
        builtin_plugin("logging").unwrap().apply(&mut hooks);
        for point in HookPoint::ALL {
            assert_eq!(hooks.tap_names(point), vec!["logging"]);
            hooks.call(point).unwrap();
        }
    }

    #[test]
    fn test_unknown_plugin() {
        let err = builtin_plugin("html").err().unwrap();
        assert!(err.to_string().contains("unknown plugin 'html'"));
    }
}

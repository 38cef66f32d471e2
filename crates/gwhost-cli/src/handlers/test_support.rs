//! Shared test doubles for handler tests.

use std::path::Path;

use gwhost_core::{ControlError, HostControl};
use mockall::mock;

mock! {
    pub Control {}
    impl HostControl for Control {
        fn open_logs_dir(&self, logs_dir: &Path) -> Result<(), ControlError>;
        fn open_external(&self, url: &str) -> Result<(), ControlError>;
        fn relaunch(&self) -> Result<(), ControlError>;
    }
}

// Boot logo - best effort, never blocks the boot

use log::{info, warn};

use crate::config::LogoConfig;
use crate::platform::BoardDisplay;

/// Show the boot logo. Returns whether a picture was put up.
pub fn show_logo<D: BoardDisplay + ?Sized>(display: &mut D, logo: &LogoConfig) -> bool {
    if !logo.show || logo.name.is_empty() {
        info!("boot logo disabled");
        return false;
    }
    if !display.show_picture(logo.name, logo.address) {
        warn!("boot logo {} not shown", logo.name);
        return false;
    }
    true
}

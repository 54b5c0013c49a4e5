use std::collections::HashMap;

use crate::predict::PassWindow;

/// Latest fetched window per satellite. Entries are replaced, never removed.
#[derive(Debug, Default)]
pub struct PassCache {
    windows: HashMap<u32, PassWindow>,
}

impl PassCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, norad_id: u32) -> Option<&PassWindow> {
        self.windows.get(&norad_id)
    }

    pub fn put(&mut self, norad_id: u32, window: PassWindow) {
        self.windows.insert(norad_id, window);
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }
}

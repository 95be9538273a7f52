#[cfg(test)]
#[path = "scroll_test.rs"]
mod tests;

const PAGE: u16 = 10;

/// Vertical offset into the rendered conversation, in lines.
#[derive(Default)]
pub struct Scroll {
    list_length: u16,
    viewport_length: u16,
    pub position: u16,
}

impl Scroll {
    fn max_position(&self) -> u16 {
        return self.list_length.saturating_sub(self.viewport_length);
    }

    pub fn up(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    pub fn up_page(&mut self) {
        self.position = self.position.saturating_sub(PAGE);
    }

    pub fn down(&mut self) {
        self.position = self.position.saturating_add(1).min(self.max_position());
    }

    pub fn down_page(&mut self) {
        self.position = self
            .position
            .saturating_add(PAGE)
            .min(self.max_position());
    }

    pub fn last(&mut self) {
        self.position = self.max_position();
    }

    pub fn set_state(&mut self, list_length: u16, viewport_length: u16) {
        self.list_length = list_length;
        self.viewport_length = viewport_length;
        self.position = self.position.min(self.max_position());
    }
}

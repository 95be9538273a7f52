use ratatui::prelude::Alignment;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;
use ratatui::widgets::Paragraph;

const FRAMES: [&str; 4] = ["", ".", "..", "..."];

#[derive(Default)]
pub struct Loading {
    tick: usize,
}

impl Loading {
    pub fn tick(&mut self) {
        self.tick = (self.tick + 1) % FRAMES.len();
    }

    pub fn widget<'a>(&self) -> Paragraph<'a> {
        return Paragraph::new(format!("Timothy is typing{}", FRAMES[self.tick]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .padding(Padding::new(1, 1, 0, 0)),
            )
            .alignment(Alignment::Center);
    }
}

use crossterm::event::{KeyCode, KeyModifiers};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::dashboard::Controller;
use crate::event::Filter;
use crate::fetch::EventSource;
use crate::ui::{self, ViewOptions};

pub struct App {
    pub should_quit: bool,
    pub config: Config,
    pub controller: Controller,
    pub scroll_offset: usize,
}

impl App {
    pub fn new(config: Config, source: Arc<dyn EventSource>) -> App {
        let controller = Controller::new(
            source,
            config.ui.initial_filter.clone(),
            config.poll_interval(),
        );

        App {
            should_quit: false,
            config,
            controller,
            scroll_offset: 0,
        }
    }

    /// Begin polling. Needs a running tokio runtime.
    pub fn start(&mut self) {
        info!(
            "Polling {} every {}s",
            self.config.endpoint,
            self.config.poll_interval().as_secs()
        );
        self.controller.mount();
    }

    pub fn stop(&mut self) {
        self.controller.unmount();
    }

    /// Apply finished fetches; returns true if a redraw is needed.
    pub fn pump(&mut self) -> bool {
        let changed = self.controller.drain();
        if changed {
            self.clamp_scroll();
        }
        changed
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                info!("Quit requested by user");
                self.should_quit = true;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                info!("Ctrl+C pressed, quitting");
                self.should_quit = true;
            }
            KeyCode::Char('f') | KeyCode::Tab => {
                let next = self.controller.state().filter.next();
                self.select_filter(next);
            }
            KeyCode::Char('F') | KeyCode::BackTab => {
                let previous = self.controller.state().filter.previous();
                self.select_filter(previous);
            }
            KeyCode::Char(c @ '0'..='3') => {
                let index = c as usize - '0' as usize;
                self.select_filter(Filter::CYCLE[index].clone());
            }
            KeyCode::Char('r') => self.controller.refresh(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
            _ => {}
        }
    }

    pub fn select_filter(&mut self, filter: Filter) {
        self.scroll_offset = 0;
        self.controller.set_filter(filter);
    }

    pub fn scroll_down(&mut self) {
        if self.scroll_offset + 1 < self.controller.state().events.len() {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        if self.scroll_offset > 0 {
            self.scroll_offset -= 1;
        }
    }

    fn clamp_scroll(&mut self) {
        let len = self.controller.state().events.len();
        self.scroll_offset = self.scroll_offset.min(len.saturating_sub(1));
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            scroll_offset: self.scroll_offset,
            poll_interval_secs: self.controller.period().as_secs(),
            show_branch_transition: self.config.ui.show_branch_transition,
        }
    }

    pub fn ui(&self, f: &mut ratatui::Frame) {
        ui::render(f, self.controller.state(), &self.view_options());
    }
}

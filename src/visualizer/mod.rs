mod keymap;

use corn64::config::Config;
use corn64::display_sync::{DisplaySync, Surface};
use corn64::session::Session;
use keymap::Command;
use log::{error, info};
use sfml::graphics::{Color, RenderTarget, RenderWindow, Sprite, Texture, Transformable};
use sfml::system::{SfBox, Vector2f};
use sfml::window::{ContextSettings, Event, Style, VideoMode};
use std::path::PathBuf;
use std::time::Instant;

const TITLE: &str = "corn64";

/// Texture the latest frame is uploaded to.
struct TextureSurface {
    texture: SfBox<Texture>,
    has_frame: bool,
}

impl TextureSurface {
    fn new(width: u32, height: u32) -> Option<TextureSurface> {
        Texture::new(width, height).map(|texture| TextureSurface {
            texture,
            has_frame: false,
        })
    }

    fn draw(&self, window: &mut RenderWindow, scale: f32) {
        if !self.has_frame {
            return;
        }
        let mut sprite = Sprite::with_texture(&self.texture);
        sprite.set_scale(Vector2f::new(scale, scale));
        window.draw(&sprite);
    }
}

impl Surface for TextureSurface {
    fn present(&mut self, width: u32, height: u32, rgba: &[u8]) {
        // SAFETY: the caller passes a full width×height RGBA frame matching the texture size.
        unsafe { self.texture.update_from_pixels(rgba, width, height, 0, 0) };
        self.has_frame = true;
    }
}

pub struct Visualizer {
    window: RenderWindow,
    surface: TextureSurface,
    sync: DisplaySync,
    scale: f32,
    title: String,
}

impl Visualizer {
    pub fn new(config: &Config) -> Option<Visualizer> {
        let (width, height) = config.window_size()?;
        let video_mode = VideoMode::new(width, height, 32);
        let mut window = RenderWindow::new(
            video_mode,
            TITLE,
            Style::CLOSE,
            &ContextSettings::default(),
        );
        window.set_framerate_limit(60);
        let surface = TextureSurface::new(config.width, config.height)?;
        Some(Visualizer {
            window,
            surface,
            sync: DisplaySync::new(config.refresh_interval(), Instant::now()),
            scale: config.scale as f32,
            title: String::new(),
        })
    }

    /// The UI loop. Handles input, refreshes the picture through
    /// `DisplaySync` and keeps the title in line with the session status.
    pub fn run(&mut self, session: &mut Session, rom: Option<PathBuf>) {
        while self.window.is_open() {
            while let Some(event) = self.window.poll_event() {
                match event {
                    Event::Closed => self.window.close(),
                    Event::KeyPressed { code, .. } => match keymap::command_for(code) {
                        Some(Command::Load) => match &rom {
                            Some(path) => {
                                session.load_file(path);
                            }
                            None => info!("No ROM path given on the command line"),
                        },
                        Some(Command::Start) => session.start(),
                        Some(Command::Stop) => session.stop(),
                        Some(Command::Quit) => self.window.close(),
                        None => {}
                    },
                    _ => { /* do nothing */ }
                }
            }

            session.poll_events();
            self.sync
                .poll(Instant::now(), session.executor(), &mut self.surface);
            self.update_title(session.status());

            self.window.clear(Color::BLACK);
            self.surface.draw(&mut self.window, self.scale);
            self.window.display();
        }
    }

    fn update_title(&mut self, status: &str) {
        if self.title != status {
            self.title = status.to_string();
            self.window
                .set_title(&format!("{} - {}", TITLE, self.title));
        }
    }
}

pub fn main(config: &Config, session: &mut Session, rom: Option<PathBuf>) {
    match Visualizer::new(config) {
        Some(mut visualizer) => visualizer.run(session, rom),
        None => error!(
            "Could not create a {}x{} window at scale {}",
            config.width, config.height, config.scale
        ),
    }
}

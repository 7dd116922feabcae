//! SDL2 Window Display Module
//! Creates the output window, renders annotated frames with an FPS
//! overlay, and polls for the quit key.

use std::time::{Duration, Instant};

use color_eyre::{eyre::eyre, Result};
use image::RgbImage;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use tracing::info;

use crate::annotate::draw::{GREEN, WHITE};
use crate::annotate::Painter;
use crate::pipeline::SharedDisplayState;
use crate::shutdown::Shutdown;
use crate::DisplayConfig;

const HELP_TEXT: &str = "Press 'q' to quit";
const IDLE_SLEEP: Duration = Duration::from_millis(5);

/// SDL2 Window Display
/// Handles window creation, the render loop, and frame presentation.
/// Must live on the main thread; the canvas is not safe to share.
pub struct Sdl2Display {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
}

impl Sdl2Display {
    pub fn new(sdl_context: &sdl2::Sdl, width: u32, height: u32) -> Result<Self> {
        let video_subsystem = sdl_context.video().map_err(|e| eyre!(e))?;

        let window_builder = video_subsystem
            .window("argus", width, height)
            .position_centered()
            .build()?;

        let canvas_builder = window_builder.into_canvas().present_vsync();

        let canvas = canvas_builder.build()?;
        let texture_creator = canvas.texture_creator();

        Ok(Self {
            canvas,
            texture_creator,
        })
    }

    fn render_frame(&mut self, image: &RgbImage) -> Result<()> {
        let (width, height) = image.dimensions();
        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::RGB24, width, height)
            .map_err(|e| eyre!(e))?;

        texture
            .update(None, image.as_raw(), (width * 3) as usize)
            .map_err(|e| eyre!(e))?;

        self.canvas.clear();
        self.canvas
            .copy(&texture, None, None)
            .map_err(|e| eyre!(e))?;

        self.canvas.present();
        Ok(())
    }

    /// Render loop: snapshot, overlay the measured frame rate, present,
    /// poll for quit. Returns after the quit key, window close, or an
    /// external interrupt (shutdown trigger).
    pub fn run(
        &mut self,
        sdl_context: &sdl2::Sdl,
        shared: &SharedDisplayState,
        painter: &Painter,
        config: &DisplayConfig,
        shutdown: &Shutdown,
    ) -> Result<()> {
        let mut event_pump = sdl_context.event_pump().map_err(|e| eyre!(e))?;
        let reset_interval = Duration::from_millis(config.fps_reset_ms);
        let mut frames_rendered: u64 = 0;
        let mut window_start = Instant::now();

        'running: loop {
            for event in event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => {
                        info!("quit event received");
                        break 'running;
                    }
                    Event::KeyDown {
                        keycode: Some(Keycode::Q),
                        ..
                    } => {
                        info!("quit key pressed");
                        break 'running;
                    }
                    _ => {}
                }
            }

            // An external interrupt takes the same exit path as the quit key.
            if shutdown.is_triggered() {
                info!("shutdown signal observed by render loop");
                break;
            }

            match shared.snapshot() {
                Some(frame) => {
                    frames_rendered += 1;
                    let elapsed = window_start.elapsed();
                    let fps = frames_rendered as f64 / elapsed.as_secs_f64().max(1e-6);

                    let mut canvas_image = frame.image.clone();
                    painter.draw_text(
                        &mut canvas_image,
                        &format!("FPS: {fps:.1}"),
                        10,
                        10,
                        28.0,
                        GREEN,
                    );
                    let help_y = canvas_image.height().saturating_sub(26) as i32;
                    painter.draw_text(&mut canvas_image, HELP_TEXT, 10, help_y, 18.0, WHITE);

                    self.render_frame(&canvas_image)?;

                    if elapsed >= reset_interval {
                        frames_rendered = 0;
                        window_start = Instant::now();
                    }
                }
                None => std::thread::sleep(IDLE_SLEEP),
            }
        }

        Ok(())
    }
}

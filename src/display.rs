#[cfg(feature = "display")]
use crate::line::BusLine;
#[cfg(feature = "display")]
use crate::schedule::DepartureBoard;
#[cfg(feature = "display")]
use embedded_graphics::{
    mono_font::{ascii::FONT_4X6, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    text::Text,
};
#[cfg(feature = "display")]
use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix, LedMatrixOptions};

#[cfg(feature = "display")]
pub struct DisplayConfig {
    /// Matrix width in pixels
    pub width: u32,
    /// Matrix height in pixels
    pub height: u32,
    /// Hardware mapping (e.g., "regular", "adafruit-hat", etc.)
    pub hardware_mapping: String,
}

#[cfg(feature = "display")]
impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 32,
            hardware_mapping: "regular".to_string(),
        }
    }
}

/// Stop-side LED sign showing the next departure of one line.
#[cfg(feature = "display")]
pub struct StopSign {
    matrix: LedMatrix,
    config: DisplayConfig,
}

#[cfg(feature = "display")]
impl StopSign {
    pub fn new() -> Result<Self, String> {
        Self::with_config(DisplayConfig::default())
    }

    pub fn with_config(config: DisplayConfig) -> Result<Self, String> {
        let mut options = LedMatrixOptions::new();
        options.set_cols(config.width);
        options.set_rows(config.height);
        options.set_hardware_mapping(&config.hardware_mapping);

        let matrix = LedMatrix::new(Some(options), None)
            .map_err(|e| format!("Failed to initialize LED matrix: {}", e))?;

        Ok(Self { matrix, config })
    }

    /// Three lines: line number and destination, then the next departure
    /// time or a closed/finished notice.
    pub fn render(&mut self, line: &BusLine, board: &DepartureBoard<'_>) {
        let mut canvas = self.matrix.offscreen_canvas();
        canvas.fill(&LedColor { red: 0, green: 0, blue: 0 });

        let text_color = parse_hex_color(line.color()).unwrap_or(LedColor {
            red: 42,
            green: 183,
            blue: 106,
        });

        let line_height = 9;
        let start_y = 5;
        let max_width = (self.config.width / 4) as usize; // 4px wide glyphs

        let heading = format!("{} {}", line.number, line.destination());
        let heading: String = heading.chars().take(max_width).collect();
        self.draw_text(&mut canvas, &heading, 2, start_y, text_color);

        let status = match board {
            DepartureBoard::NoService => "Sem operacao".to_string(),
            DepartureBoard::AllDeparted(_) => "Encerrado".to_string(),
            DepartureBoard::Upcoming { .. } => {
                let de = board.next_row().and_then(|r| r.de.as_deref()).unwrap_or("--:--");
                format!("Prox {}", de)
            }
        };
        self.draw_text(&mut canvas, &status, 2, start_y + line_height, text_color);

        if let Some(arrival) = board.next_row().and_then(|r| r.ate.as_deref()) {
            let arrival = format!("Chega {}", arrival);
            self.draw_text(&mut canvas, &arrival, 2, start_y + 2 * line_height, text_color);
        }

        let old_canvas = self.matrix.swap(canvas);
        drop(old_canvas);
    }

    fn draw_text(&self, canvas: &mut LedCanvas, text: &str, x: i32, y: i32, color: LedColor) {
        let rgb_color = Rgb888::new(color.red, color.green, color.blue);
        let style = MonoTextStyle::new(&FONT_4X6, rgb_color);
        let _ = Text::new(text, Point::new(x, y), style).draw(canvas);
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

// "#rrggbb" -> LedColor
#[cfg(feature = "display")]
fn parse_hex_color(hex: &str) -> Option<LedColor> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(LedColor {
        red: channel(0)?,
        green: channel(2)?,
        blue: channel(4)?,
    })
}

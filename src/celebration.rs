use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;

const SPARK_SYMBOLS: [char; 6] = ['*', '+', '·', '✦', '✧', '•'];
const MIN_SIZE: f64 = 0.2;

/// Particle for the escape fireworks
#[derive(Debug, Clone)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub size: f64,
    pub symbol: char,
    pub color_index: usize,
    pub is_text: bool, // Whether this particle spells out the banner
    pub target_x: f64,
    pub target_y: f64,
}

impl Spark {
    /// A rocket launched from the bottom edge
    fn launch(width: f64, height: f64, rng: &mut ThreadRng) -> Self {
        let x = rng.gen_range(0.0..width.max(1.0));
        Self {
            x,
            y: height,
            vel_x: rng.gen_range(-1.5..1.5),
            vel_y: rng.gen_range(-6.0..-1.0),
            size: rng.gen_range(1.0..6.0),
            symbol: *SPARK_SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            is_text: false,
            target_x: x,
            target_y: 0.0,
        }
    }

    fn banner_letter(
        x: f64,
        y: f64,
        target_x: f64,
        target_y: f64,
        symbol: char,
        color_index: usize,
    ) -> Self {
        Self {
            x,
            y,
            vel_x: target_x - x,
            vel_y: target_y - y,
            size: f64::MAX,
            symbol,
            color_index,
            is_text: true,
            target_x,
            target_y,
        }
    }

    /// Returns false once a spark has burnt out
    fn update(&mut self, dt: f64) -> bool {
        if self.is_text {
            let dist = ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
            if dist > 0.5 {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_x *= 0.95;
                self.vel_y *= 0.95;
                // never overshoot
                if (self.target_x - self.x).signum() != self.vel_x.signum() && self.vel_x != 0.0 {
                    self.x = self.target_x;
                }
                if (self.target_y - self.y).signum() != self.vel_y.signum() && self.vel_y != 0.0 {
                    self.y = self.target_y;
                }
            } else {
                self.x = self.target_x;
                self.y = self.target_y;
                self.vel_x = 0.0;
                self.vel_y = 0.0;
            }
            return true;
        }

        self.x += self.vel_x * dt * 10.0;
        self.y += self.vel_y * dt * 10.0;
        self.size -= 1.0 * dt;
        self.size > MIN_SIZE
    }

    /// Fade level in 0..=1, used to pick a style
    pub fn brightness(&self) -> f64 {
        if self.is_text {
            1.0
        } else {
            (self.size / 6.0).clamp(0.0, 1.0)
        }
    }
}

/// Fireworks shown once the final round is escaped.
///
/// Driven by the game tick; burnt-out sparks are replaced by new launches
/// so the display keeps going until `stop` is called.
#[derive(Debug)]
pub struct Fireworks {
    pub sparks: Vec<Spark>,
    pub is_active: bool,
    pub spark_count: usize,
    pub width: f64,
    pub height: f64,
}

impl Fireworks {
    pub fn new() -> Self {
        Self {
            sparks: Vec::new(),
            is_active: false,
            spark_count: 60,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16, banner: &str) {
        let mut rng = rand::thread_rng();

        self.sparks.clear();
        self.is_active = true;
        self.width = width as f64;
        self.height = height as f64;

        self.spell_banner(banner, &mut rng);
        for _ in 0..self.spark_count {
            self.sparks.push(Spark::launch(self.width, self.height, &mut rng));
        }
    }

    fn spell_banner(&mut self, text: &str, rng: &mut ThreadRng) {
        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;
        let char_width = 2.0;
        let text_width = (text.chars().count() as f64 - 1.0).max(0.0) * char_width;
        let start_x = center_x - text_width / 2.0;

        for (i, ch) in text.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let target_x = start_x + i as f64 * char_width;
            let target_y = center_y - 2.0;
            let from_x = center_x + rng.gen_range(-10.0..10.0);
            let from_y = center_y + rng.gen_range(-5.0..5.0);
            self.sparks.push(Spark::banner_letter(
                from_x,
                from_y,
                target_x,
                target_y,
                ch,
                rng.gen_range(0..7),
            ));
        }
    }

    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }
        let (width, height) = (self.width, self.height);
        let before = self.sparks.len();
        self.sparks.retain_mut(|spark| {
            let alive = spark.update(dt);
            if spark.is_text {
                return true;
            }
            let buffer = 5.0;
            let off_screen = spark.y < -buffer || spark.x < -buffer || spark.x > width + buffer;
            alive && !off_screen
        });

        let mut rng = rand::thread_rng();
        for _ in self.sparks.len()..before {
            self.sparks.push(Spark::launch(width, height, &mut rng));
        }
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.sparks.clear();
    }
}

impl Default for Fireworks {
    fn default() -> Self {
        Self::new()
    }
}

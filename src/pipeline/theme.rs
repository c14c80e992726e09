//! Document colour theme.
//!
//! Two strategies, selected by [`ThemeStrategy`]:
//!
//! * **Deterministic**: the background is a gray whose level is the sum of
//!   the lower-cased topic's code points modulo 256. Text is white when the
//!   HSL lightness of the background is below 0.5, black otherwise. The same
//!   topic always yields the same colours.
//! * **Randomized**: every background channel is drawn from 0–100, which
//!   keeps the page dark enough for fixed white text.

use crate::config::ThemeStrategy;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An sRGB colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Channels scaled to 0.0–1.0, as PDF colour operators expect.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }

    /// HSL lightness: mean of the largest and smallest channel, 0.0–1.0.
    pub fn lightness(self) -> f32 {
        let [r, g, b] = self.to_unit();
        (r.max(g).max(b) + r.min(g).min(b)) / 2.0
    }

    /// White on dark backgrounds, black on light ones.
    pub fn contrasting_text(self) -> Rgb {
        if self.lightness() < 0.5 {
            Rgb::WHITE
        } else {
            Rgb::BLACK
        }
    }
}

/// Colours applied to every page of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub background: Rgb,
    pub title_color: Rgb,
    pub body_color: Rgb,
}

/// Picks a [`Theme`] for a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorPolicy {
    strategy: ThemeStrategy,
}

impl ColorPolicy {
    pub fn new(strategy: ThemeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ThemeStrategy {
        self.strategy
    }

    /// Choose the theme. `seed` is the topic; `None` behaves like an empty
    /// topic for the deterministic strategy and is ignored by the random one.
    pub fn pick_theme(&self, seed: Option<&str>) -> Theme {
        match self.strategy {
            ThemeStrategy::Deterministic => deterministic_theme(seed.unwrap_or("")),
            ThemeStrategy::Randomized => randomized_theme(&mut rand::thread_rng()),
        }
    }
}

/// Gray level derived from the topic.
pub fn topic_gray(topic: &str) -> u8 {
    let sum: u64 = topic.to_lowercase().chars().map(|c| c as u64).sum();
    (sum % 256) as u8
}

fn deterministic_theme(topic: &str) -> Theme {
    let g = topic_gray(topic);
    let background = Rgb(g, g, g);
    let text = background.contrasting_text();
    Theme {
        background,
        title_color: text,
        body_color: text,
    }
}

fn randomized_theme<R: Rng + ?Sized>(rng: &mut R) -> Theme {
    let background = Rgb(
        rng.gen_range(0..=100),
        rng.gen_range(0..=100),
        rng.gen_range(0..=100),
    );
    Theme {
        background,
        title_color: Rgb::WHITE,
        body_color: Rgb::WHITE,
    }
}

use serde::{Deserialize, Serialize};

/// Pre-ranking gate for navigation junk, headers and fragments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseFilter {
    pub min_words: usize,
    pub min_chars: usize,
    /// Share of uppercase letters among alphabetic characters above which a
    /// chunk counts as an all-caps header.
    #[serde(default = "default_max_upper_ratio")]
    pub max_upper_ratio: f32,
}

fn default_max_upper_ratio() -> f32 {
    0.6
}

impl NoiseFilter {
    /// Thresholds for the general industry pass.
    pub fn general() -> Self {
        Self {
            min_words: 5,
            min_chars: 60,
            max_upper_ratio: default_max_upper_ratio(),
        }
    }

    /// Looser thresholds for the per-industry thesis pass.
    pub fn thesis() -> Self {
        Self {
            min_words: 3,
            min_chars: 30,
            max_upper_ratio: default_max_upper_ratio(),
        }
    }

    pub fn is_noise(&self, text: &str) -> bool {
        if text.split_whitespace().count() < self.min_words {
            return true;
        }
        if text.chars().count() < self.min_chars {
            return true;
        }

        let (letters, upper) = text
            .chars()
            .filter(|c| c.is_alphabetic())
            .fold((0usize, 0usize), |(letters, upper), c| {
                (letters + 1, upper + usize::from(c.is_uppercase()))
            });

        letters > 0 && upper as f32 / letters as f32 > self.max_upper_ratio
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::general()
    }
}

//! services/site/src/adapters/fortune.rs
//!
//! The fortune cookie shown on the about page.

use meadowlark_core::ports::FortuneService;
use rand::seq::SliceRandom;

const FORTUNES: &[&str] = &[
    "Conquer your fears or they will conquer you.",
    "Rivers need springs.",
    "Do not fear what you don't know.",
    "You will have a pleasant surprise.",
    "Whenever possible, keep it simple.",
];

/// Picks a fortune at random from a fixed list.
#[derive(Clone, Default)]
pub struct FortuneCookies;

impl FortuneService for FortuneCookies {
    fn fortune(&self) -> String {
        FORTUNES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(FORTUNES[0])
            .to_string()
    }
}

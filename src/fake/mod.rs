//! Fake user and post content
//!
//! Every session owns its own [`FakeData`]; nothing here is shared between
//! tasks. A run seed makes a session's usernames, posts and like targets
//! reproducible.

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "brisk", "calm", "daring", "eager", "fuzzy", "gentle", "hollow", "icy", "jolly",
    "keen", "lucky", "mellow", "nimble", "odd", "plucky", "quiet", "rusty", "silent", "tidy",
    "upbeat", "vivid", "witty", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "badger", "comet", "dune", "falcon", "garnet", "harbor", "heron", "island", "lantern",
    "meadow", "nebula", "otter", "pebble", "quartz", "raven", "spruce", "thistle", "walrus",
    "willow", "yak",
];

const PHRASE_VERBS: &[&str] = &[
    "Streamlined", "Adaptive", "Synergized", "Decentralized", "Balanced", "Focused",
    "Integrated", "Open-source", "Reactive", "User-centric",
];

const PHRASE_NOUNS: &[&str] = &[
    "workflow", "paradigm", "framework", "interface", "initiative", "middleware", "toolset",
    "approach", "benchmark", "roadmap",
];

const WORDS: &[&str] = &[
    "the", "morning", "garden", "coffee", "walk", "river", "book", "quiet", "city", "light",
    "friends", "weekend", "music", "window", "rain", "street", "market", "bread", "train",
    "mountain", "evening", "story", "little", "bright", "long", "today", "again", "across",
];

/// Fake-data generator owned by one session
#[derive(Debug, Clone)]
pub struct FakeData {
    rng: ChaCha8Rng,
}

impl FakeData {
    /// Generator for session `index`; seeded runs derive a distinct stream per session
    pub fn for_session(seed: Option<u64>, index: usize) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed.wrapping_add(index as u64)),
            None => Self::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Random source for sampling decisions made by the session
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    fn pick(&mut self, words: &[&'static str]) -> &'static str {
        words.choose(&mut self.rng).copied().unwrap_or("user")
    }

    /// `adjective_noun1234`
    pub fn username(&mut self) -> String {
        let adjective = self.pick(ADJECTIVES);
        let noun = self.pick(NOUNS);
        let suffix: u32 = self.rng.gen_range(1000..10000);
        format!("{}_{}{}", adjective, noun, suffix)
    }

    /// 12 to 16 alphanumeric characters, at least one of them a digit
    pub fn password(&mut self) -> String {
        let len = self.rng.gen_range(12..=16);
        let mut password: Vec<u8> = (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .collect();

        if !password.iter().any(u8::is_ascii_digit) {
            let at = self.rng.gen_range(0..len);
            password[at] = b'0' + self.rng.gen_range(0..10u8);
        }

        password.into_iter().map(char::from).collect()
    }

    /// Short title, e.g. "Adaptive meadow roadmap"
    pub fn catch_phrase(&mut self) -> String {
        let lead = self.pick(PHRASE_VERBS);
        let middle = self.pick(NOUNS);
        let tail = self.pick(PHRASE_NOUNS);
        format!("{} {} {}", lead, middle, tail)
    }

    /// One capitalised sentence of 4 to 10 words
    pub fn sentence(&mut self) -> String {
        let len = self.rng.gen_range(4..=10);
        let words: Vec<&str> = (0..len).map(|_| self.pick(WORDS)).collect();
        let mut sentence = words.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }

    /// `sentences` sentences separated by single spaces
    pub fn paragraph(&mut self, sentences: usize) -> String {
        (0..sentences)
            .map(|_| self.sentence())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

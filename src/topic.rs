//! Human-readable random topic names.
//!
//! A topic works like a password: whoever knows it can subscribe. Names are
//! built from distinct words drawn with the thread-local CSPRNG, in the spirit
//! of <https://xkcd.com/936/>. Six words from the short list below give a bit
//! over 50 bits of entropy.

use rand::seq::IndexedRandom;

/// Number of words in a generated topic.
pub const TOPIC_WORDS: usize = 6;

/// Generates a dash-separated topic such as `maple-orbit-quiet-lamp-fern-dock`.
pub fn generate_topic() -> String {
    let mut rng = rand::rng();
    let words: Vec<&str> = WORDS
        .choose_multiple(&mut rng, TOPIC_WORDS)
        .copied()
        .collect();
    words.join("-")
}

static WORDS: &[&str] = &[
    "acorn", "actor", "adobe", "agent", "alarm", "album", "alley", "amber", "anchor", "angle",
    "ankle", "apple", "apron", "arch", "arena", "armor", "arrow", "ash", "aspen", "atlas",
    "attic", "audio", "autumn", "axis", "bacon", "badge", "bagel", "baker", "bamboo", "banjo",
    "barn", "basil", "basin", "beach", "beacon", "beam", "bean", "bear", "beetle", "bell",
    "bench", "berry", "bike", "birch", "bison", "blade", "blaze", "bloom", "board", "boat",
    "bolt", "bonus", "boot", "bottle", "bow", "brain", "brass", "bread", "breeze", "brick",
    "bridge", "brook", "brush", "bucket", "bugle", "bunny", "cabin", "cable", "cactus", "cake",
    "camel", "camera", "candle", "candy", "canoe", "canyon", "cargo", "carpet", "carrot", "castle",
    "cedar", "cello", "chalk", "charm", "cherry", "chess", "chime", "cider", "circle", "citrus",
    "clay", "cliff", "clock", "cloud", "clover", "coast", "cobalt", "cocoa", "comet", "copper",
    "coral", "cotton", "crane", "crater", "crayon", "creek", "cricket", "crown", "crystal", "cube",
    "daisy", "dawn", "delta", "denim", "desert", "dial", "diner", "disk", "dock", "dolphin",
    "donut", "dove", "dragon", "drum", "dune", "eagle", "earth", "easel", "echo", "eclipse",
    "ember", "engine", "fabric", "falcon", "fern", "ferry", "fiddle", "field", "fig", "flame",
    "flint", "flute", "focus", "forest", "fossil", "fox", "frost", "fudge", "galaxy", "garden",
    "garlic", "gecko", "geyser", "ginger", "glacier", "globe", "glove", "goose", "granite", "grape",
    "gravel", "guitar", "gull", "hammer", "harbor", "harp", "hazel", "heron", "hill", "honey",
    "hoop", "horizon", "hound", "igloo", "indigo", "iris", "island", "ivory", "jacket", "jade",
    "jaguar", "jasmine", "jelly", "jewel", "juniper", "kayak", "kernel", "kettle", "kiwi", "koala",
    "ladder", "lagoon", "lamp", "lantern", "laser", "lava", "lemon", "lentil", "lily", "lime",
    "linen", "lion", "lizard", "llama", "lobster", "locket", "lotus", "lunar", "magnet", "mango",
    "maple", "marble", "meadow", "melon", "meteor", "mint", "mirror", "mocha", "monkey", "moose",
    "mosaic", "moss", "motor", "muffin", "nectar", "needle", "nest", "nickel", "noodle", "nova",
    "nutmeg", "oasis", "ocean", "olive", "onion", "opal", "orbit", "orchid", "otter", "owl",
    "paddle", "palm", "panda", "paper", "parrot", "pasta", "peach", "pearl", "pebble", "pepper",
    "piano", "pickle", "pigeon", "pilot", "pine", "pixel", "planet", "plum", "polar", "pony",
    "poppy", "prism", "pulse", "puzzle", "quartz", "quiet", "quill", "rabbit", "radar", "radio",
    "raven", "reef", "ribbon", "ridge", "river", "robin", "rocket", "rose", "ruby", "saddle",
    "saffron", "salmon", "sand", "satin", "scarf", "shell", "signal", "silver", "sketch", "sled",
    "slope", "smoke", "snail", "socket", "sonar", "spark", "sphere", "spice", "spider", "spruce",
    "squid", "stone", "storm", "stream", "sugar", "summit", "sunset", "swan", "syrup", "tablet",
    "tango", "thistle", "thunder", "tiger", "timber", "toast", "tomato", "topaz", "torch", "tower",
    "trail", "tulip", "tundra", "turtle", "twig", "umber", "valley", "velvet", "violet", "violin",
    "walnut", "walrus", "water", "whale", "wheat", "willow", "window", "winter", "wizard", "wolf",
    "yarn", "yeti", "yogurt", "zebra", "zenith", "zephyr", "zinc", "zipper", "acre", "bay",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn topic_is_made_of_known_words() {
        let topic = generate_topic();
        let parts: Vec<&str> = topic.split('-').collect();
        assert_eq!(parts.len(), TOPIC_WORDS);
        assert!(parts.iter().all(|p| WORDS.contains(p)));
    }

    #[test]
    fn words_are_distinct_within_a_topic() {
        for _ in 0..50 {
            let topic = generate_topic();
            let parts: HashSet<&str> = topic.split('-').collect();
            assert_eq!(parts.len(), TOPIC_WORDS);
        }
    }

    #[test]
    fn topics_carry_at_least_48_bits_of_entropy() {
        // Words are drawn without replacement.
        let bits: f64 = (0..TOPIC_WORDS)
            .map(|i| ((WORDS.len() - i) as f64).log2())
            .sum();
        assert!(bits >= 48.0, "only {bits:.1} bits");
    }

    #[test]
    fn word_list_has_no_duplicates_or_dashes() {
        let unique: HashSet<&&str> = WORDS.iter().collect();
        assert_eq!(unique.len(), WORDS.len());
        assert!(WORDS.iter().all(|w| !w.contains('-') && !w.is_empty()));
    }
}

//! Fixed joke pool

use rand::seq::IndexedRandom;

pub const JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "I told my computer I needed a break, and it said: no problem, I'll go to sleep.",
    "There are 10 kinds of people: those who understand binary and those who don't.",
    "A SQL query walks into a bar, goes up to two tables and asks: can I join you?",
    "Why did the developer go broke? Because he used up all his cache.",
    "Debugging: being the detective in a crime movie where you are also the murderer.",
    "It works on my machine. Then we'll ship your machine.",
    "How many programmers does it take to change a light bulb? None, that's a hardware problem.",
    "I would tell you a UDP joke, but you might not get it.",
    "Knock knock. Race condition. Who's there?",
];

/// A uniformly chosen joke
pub fn random_joke() -> &'static str {
    JOKES.choose(&mut rand::rng()).copied().unwrap_or(JOKES[0])
}

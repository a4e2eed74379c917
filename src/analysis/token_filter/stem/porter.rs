//! The Porter stemming algorithm (M.F. Porter, 1980).
//!
//! Operates on lowercase ASCII words. Words of two letters or fewer, and
//! words containing anything but ASCII letters, are returned unchanged.

use crate::analysis::token_filter::stem::Stemmer;

#[derive(Clone, Debug, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    pub fn new() -> Self {
        PorterStemmer
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word.to_string();
        }

        let mut w = Word {
            b: word.as_bytes().to_vec(),
            stem_len: 0,
        };
        w.step1ab();
        if w.b.len() > 1 {
            w.step1c();
            w.step2();
            w.step3();
            w.step4();
            w.step5();
        }

        // Only ASCII bytes are ever written, so this cannot fail.
        String::from_utf8(w.b).unwrap_or_else(|_| word.to_string())
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("logi", "log"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

struct Word {
    b: Vec<u8>,
    /// Length of the stem left when the last matched suffix is removed.
    stem_len: usize,
}

impl Word {
    fn is_consonant(&self, i: usize) -> bool {
        match self.b[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// The number of vowel-consonant sequences in the stem.
    fn measure(&self) -> usize {
        let end = self.stem_len;
        let mut n = 0;
        let mut i = 0;
        while i < end && self.is_consonant(i) {
            i += 1;
        }
        loop {
            while i < end && !self.is_consonant(i) {
                i += 1;
            }
            if i >= end {
                return n;
            }
            while i < end && self.is_consonant(i) {
                i += 1;
            }
            n += 1;
            if i >= end {
                return n;
            }
        }
    }

    fn vowel_in_stem(&self) -> bool {
        (0..self.stem_len).any(|i| !self.is_consonant(i))
    }

    /// Whether the word ends at `end` (exclusive) with a double consonant.
    fn double_consonant(&self, end: usize) -> bool {
        end >= 2 && self.b[end - 1] == self.b[end - 2] && self.is_consonant(end - 1)
    }

    /// consonant-vowel-consonant ending at index `i`, the last consonant not
    /// w, x or y.
    fn cvc(&self, i: usize) -> bool {
        if i < 2 || !self.is_consonant(i) || self.is_consonant(i - 1) || !self.is_consonant(i - 2)
        {
            return false;
        }
        !matches!(self.b[i], b'w' | b'x' | b'y')
    }

    fn ends(&mut self, suffix: &str) -> bool {
        let suffix = suffix.as_bytes();
        if self.b.ends_with(suffix) {
            self.stem_len = self.b.len() - suffix.len();
            true
        } else {
            false
        }
    }

    fn set_to(&mut self, replacement: &str) {
        self.b.truncate(self.stem_len);
        self.b.extend_from_slice(replacement.as_bytes());
    }

    fn replace_if_measured(&mut self, replacement: &str) {
        if self.measure() > 0 {
            self.set_to(replacement);
        }
    }

    fn step1ab(&mut self) {
        if self.b.last() == Some(&b's') {
            if self.ends("sses") {
                self.b.truncate(self.b.len() - 2);
            } else if self.ends("ies") {
                self.set_to("i");
            } else if self.b.len() >= 2 && self.b[self.b.len() - 2] != b's' {
                self.b.pop();
            }
        }

        if self.ends("eed") {
            if self.measure() > 0 {
                self.b.pop();
            }
        } else if (self.ends("ed") || self.ends("ing")) && self.vowel_in_stem() {
            self.b.truncate(self.stem_len);
            if self.ends("at") {
                self.set_to("ate");
            } else if self.ends("bl") {
                self.set_to("ble");
            } else if self.ends("iz") {
                self.set_to("ize");
            } else if self.double_consonant(self.b.len()) {
                if !matches!(self.b[self.b.len() - 1], b'l' | b's' | b'z') {
                    self.b.pop();
                }
            } else {
                self.stem_len = self.b.len();
                if self.measure() == 1 && self.cvc(self.b.len() - 1) {
                    self.b.push(b'e');
                }
            }
        }
    }

    fn step1c(&mut self) {
        if self.ends("y") && self.vowel_in_stem() {
            let last = self.b.len() - 1;
            self.b[last] = b'i';
        }
    }

    fn step2(&mut self) {
        for (suffix, replacement) in STEP2 {
            if self.ends(suffix) {
                self.replace_if_measured(replacement);
                return;
            }
        }
    }

    fn step3(&mut self) {
        for (suffix, replacement) in STEP3 {
            if self.ends(suffix) {
                self.replace_if_measured(replacement);
                return;
            }
        }
    }

    fn step4(&mut self) {
        for suffix in STEP4 {
            if self.ends(suffix) {
                if *suffix == "ion"
                    && !(self.stem_len > 0 && matches!(self.b[self.stem_len - 1], b's' | b't'))
                {
                    continue;
                }
                if self.measure() > 1 {
                    self.b.truncate(self.stem_len);
                }
                return;
            }
        }
    }

    fn step5(&mut self) {
        self.stem_len = self.b.len();
        let m = self.measure();
        if self.b.last() == Some(&b'e')
            && self.b.len() >= 2
            && (m > 1 || (m == 1 && !self.cvc(self.b.len() - 2)))
        {
            self.b.pop();
        }
        if self.b.last() == Some(&b'l') && self.double_consonant(self.b.len()) && m > 1 {
            self.b.pop();
        }
    }
}

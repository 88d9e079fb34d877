//! Text cleanup applied to extracted text before it enters the content model.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPreset {
    /// Minimal cleanup: Unicode NFC normalization only
    Minimal,
    /// Standard cleanup: NFC + ligatures + control characters + whitespace
    #[default]
    Standard,
    /// Aggressive cleanup: Standard + private-use characters + bullets + blank lines
    Aggressive,
}

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Fix ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Standardize bullet characters (●, ○, ■ → •)
    pub standardize_bullets: bool,

    /// Remove control characters other than newline and tab
    pub remove_control_chars: bool,

    /// Remove Private Use Area (PUA) characters
    pub remove_pua: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Collapse runs of spaces, reduce tab runs to one tab, trim each line
    pub normalize_whitespace: bool,

    /// Maximum consecutive newlines (0 = unlimited)
    pub max_consecutive_newlines: u8,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self::minimal(),
            CleanupPreset::Standard => Self::standard(),
            CleanupPreset::Aggressive => Self::aggressive(),
        }
    }

    /// Minimal cleanup options.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: false,
            standardize_bullets: false,
            remove_control_chars: false,
            remove_pua: false,
            remove_replacement_char: false,
            normalize_whitespace: false,
            max_consecutive_newlines: 0,
        }
    }

    /// Standard cleanup options.
    pub fn standard() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            standardize_bullets: false,
            remove_control_chars: true,
            remove_pua: false,
            remove_replacement_char: true,
            normalize_whitespace: true,
            max_consecutive_newlines: 2,
        }
    }

    /// Aggressive cleanup options.
    pub fn aggressive() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            standardize_bullets: true,
            remove_control_chars: true,
            remove_pua: true,
            remove_replacement_char: true,
            normalize_whitespace: true,
            max_consecutive_newlines: 1,
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Text cleanup pipeline.
#[derive(Debug, Clone)]
pub struct CleanupPipeline {
    options: CleanupOptions,
    spaces_regex: Regex,
    tabs_regex: Regex,
    newlines_regex: Option<Regex>,
    ligature_map: Vec<(&'static str, &'static str)>,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        let newlines_regex = match options.max_consecutive_newlines {
            0 => None,
            max => Some(Regex::new(&format!(r"\n{{{},}}", max as usize + 1)).unwrap()),
        };
        Self {
            options,
            spaces_regex: Regex::new(r"[ \u{00A0}]+").unwrap(),
            tabs_regex: Regex::new(r"[ \u{00A0}]*\t[ \t\u{00A0}]*").unwrap(),
            newlines_regex,
            ligature_map: vec![
                ("\u{FB00}", "ff"),
                ("\u{FB01}", "fi"),
                ("\u{FB02}", "fl"),
                ("\u{FB03}", "ffi"),
                ("\u{FB04}", "ffl"),
                ("\u{FB05}", "st"),
                ("\u{FB06}", "st"),
            ],
        }
    }

    /// Create a pipeline from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        Self::new(CleanupOptions::from_preset(preset))
    }

    /// Get the options this pipeline runs with.
    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Process text through the cleanup pipeline.
    pub fn process(&self, text: &str) -> String {
        let mut result = if self.options.normalize_unicode {
            text.nfc().collect::<String>()
        } else {
            text.to_string()
        };

        if self.options.fix_ligatures {
            for (ligature, replacement) in &self.ligature_map {
                if result.contains(ligature) {
                    result = result.replace(ligature, replacement);
                }
            }
        }

        if self.options.standardize_bullets {
            result = result.replace(['●', '○', '■', '□', '◆', '◇', '▪', '▫', '►', '▻'], "•");
        }

        if self.options.remove_control_chars
            || self.options.remove_pua
            || self.options.remove_replacement_char
        {
            result = result
                .chars()
                .filter(|c| self.keep_char(*c))
                .collect();
        }

        if self.options.normalize_whitespace {
            result = result
                .split('\n')
                .map(|line| {
                    let line = self.tabs_regex.replace_all(line, "\t");
                    self.spaces_regex.replace_all(&line, " ").trim().to_string()
                })
                .collect::<Vec<_>>()
                .join("\n");
        }

        if let Some(ref re) = self.newlines_regex {
            let replacement = "\n".repeat(self.options.max_consecutive_newlines as usize);
            result = re.replace_all(&result, replacement.as_str()).to_string();
        }

        result.trim().to_string()
    }

    fn keep_char(&self, c: char) -> bool {
        if self.options.remove_control_chars && c.is_control() && c != '\n' && c != '\t' {
            return false;
        }
        if self.options.remove_replacement_char && c == '\u{FFFD}' {
            return false;
        }
        if self.options.remove_pua {
            let code = c as u32;
            if (0xE000..=0xF8FF).contains(&code)
                || (0xF0000..=0xFFFFD).contains(&code)
                || (0x100000..=0x10FFFD).contains(&code)
            {
                return false;
            }
        }
        true
    }
}

impl Default for CleanupPipeline {
    fn default() -> Self {
        Self::new(CleanupOptions::default())
    }
}

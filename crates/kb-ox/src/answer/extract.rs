/// Wire marker preceding each answer segment in the stream payload.
pub const MARKER: &str = "textContent=";

/// Terminator of a marker's value.
const TERMINATOR: char = ',';

/// Longest value, in bytes, held back while waiting for its comma in
/// [`ExtractMode::CarryOver`]. Past this the value is cut off and emitted.
pub const MAX_OPEN_VALUE: usize = 64 * 1024;

/// How marker values are found in the decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ExtractMode {
    /// Scan across fragment boundaries. A value is emitted once its comma
    /// arrives, or at end of stream if it never does. Every marker counts.
    /// An open value longer than [`MAX_OPEN_VALUE`] is emitted as it stands
    /// and the text following it up to the next marker is dropped.
    #[default]
    CarryOver,
    /// Look at each fragment on its own and take only its first marker. The
    /// value runs to the next comma or the end of the fragment, so a value
    /// split across two network chunks is truncated.
    PerFragment,
}

/// Pulls answer segments out of decoded fragments and accumulates them.
///
/// The accumulated answer is append-only for the life of one stream.
#[derive(Debug, Clone, Default)]
pub struct AnswerExtractor {
    mode: ExtractMode,
    carry: String,
    answer: String,
}

impl AnswerExtractor {
    pub fn new(mode: ExtractMode) -> Self {
        Self {
            mode,
            carry: String::new(),
            answer: String::new(),
        }
    }

    pub fn mode(&self) -> ExtractMode {
        self.mode
    }

    /// Answer accumulated so far.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn into_answer(self) -> String {
        self.answer
    }

    /// Feed one decoded fragment. Returns `true` if the answer grew.
    pub fn push(&mut self, fragment: &str) -> bool {
        match self.mode {
            ExtractMode::PerFragment => match first_value(fragment) {
                Some(value) => self.append(value),
                None => false,
            },
            ExtractMode::CarryOver => {
                self.carry.push_str(fragment);
                self.drain_carry()
            }
        }
    }

    /// Signal end of stream. Flushes a value still waiting for its comma.
    /// Returns `true` if the answer grew.
    pub fn finish(&mut self) -> bool {
        let carry = std::mem::take(&mut self.carry);
        match carry.strip_prefix(MARKER) {
            Some(value) if !value.is_empty() => self.append(value),
            _ => false,
        }
    }

    fn append(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.answer.push_str(value);
        true
    }

    fn drain_carry(&mut self) -> bool {
        let mut grew = false;
        loop {
            let Some(start) = self.carry.find(MARKER) else {
                let keep = partial_marker_len(&self.carry);
                self.carry.drain(..self.carry.len() - keep);
                return grew;
            };

            let value_start = start + MARKER.len();
            let Some(offset) = self.carry[value_start..].find(TERMINATOR) else {
                // Value still open: keep from the marker on.
                self.carry.drain(..start);
                if self.carry.len() - MARKER.len() > MAX_OPEN_VALUE {
                    let carry = std::mem::take(&mut self.carry);
                    grew |= self.append(&carry[MARKER.len()..]);
                }
                return grew;
            };

            let value_end = value_start + offset;
            if offset > 0 {
                let value = self.carry[value_start..value_end].to_string();
                grew |= self.append(&value);
            }
            self.carry.drain(..=value_end);
        }
    }
}

/// First marker value inside `text` whose run up to the next comma (or the
/// end of `text`) is non-empty.
fn first_value(text: &str) -> Option<&str> {
    text.match_indices(MARKER).find_map(|(start, _)| {
        let rest = &text[start + MARKER.len()..];
        let value = rest.split(TERMINATOR).next().unwrap_or_default();
        (!value.is_empty()).then_some(value)
    })
}

/// Length of the longest suffix of `text` that is a proper prefix of the
/// marker.
fn partial_marker_len(text: &str) -> usize {
    (1..MARKER.len())
        .rev()
        .find(|&len| text.ends_with(&MARKER[..len]))
        .unwrap_or(0)
}

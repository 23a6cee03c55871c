//! Classification of `getevent -l` output lines.
//!
//! With `-l`, `getevent` prints one kernel input event per line using symbolic
//! names, for example:
//!
//! ```text
//! EV_ABS       ABS_MT_POSITION_X    000001a4
//! EV_ABS       ABS_MT_POSITION_Y    00000832
//! EV_KEY       BTN_TOUCH            DOWN
//! EV_SYN       SYN_REPORT           00000000
//! EV_KEY       BTN_TOUCH            UP
//! ```
//!
//! When no device path is passed, each line is additionally prefixed with the
//! device node (`/dev/input/event3: EV_ABS ...`).  Only four shapes matter for
//! tap replay; everything else is [`LineEvent::Ignored`].
//!
//! Matching is token based and anchored at the end of the trimmed line: the
//! value (or the `DOWN`/`UP` state) must be the last token, and the event code
//! must be the token right before it.  Axis values must be exactly eight
//! lowercase hex digits.

use serde::{Deserialize, Serialize};

/// Event code of the multi-touch X position report.
pub const ABS_MT_POSITION_X: &str = "ABS_MT_POSITION_X";
/// Event code of the multi-touch Y position report.
pub const ABS_MT_POSITION_Y: &str = "ABS_MT_POSITION_Y";
/// Event code of the primary contact button.
pub const BTN_TOUCH: &str = "BTN_TOUCH";

const EV_ABS: &str = "EV_ABS";
const EV_KEY: &str = "EV_KEY";
const HEX_DIGITS: usize = 8;

/// One of the two absolute-position axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// A decoded axis sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub axis: Axis,
    pub value: u32,
}

/// Result of classifying one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    XSample(u32),
    YSample(u32),
    TouchDown,
    TouchUp,
    Ignored,
}

impl LineEvent {
    /// Returns the axis sample carried by this event, if any.
    pub fn sample(&self) -> Option<RawSample> {
        match *self {
            LineEvent::XSample(value) => Some(RawSample { axis: Axis::X, value }),
            LineEvent::YSample(value) => Some(RawSample { axis: Axis::Y, value }),
            _ => None,
        }
    }
}

/// How strictly the event-type token is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDialect {
    /// `EV_ABS ABS_MT_POSITION_X <hex>` / `EV_KEY BTN_TOUCH DOWN`: the event
    /// type must directly precede the code.
    #[default]
    Strict,
    /// The code may appear anywhere before the value; the event type is not
    /// required.
    Lenient,
}

/// Classifies a line with the default [`LineDialect::Strict`] rules.
pub fn classify_line(line: &str) -> LineEvent {
    classify(line, LineDialect::Strict)
}

/// Classifies one line of `getevent -l` output.
///
/// Leading and trailing whitespace is ignored.  Lines that match none of the
/// four known shapes, including axis lines whose value is not exactly eight
/// lowercase hex digits, classify as [`LineEvent::Ignored`].
pub fn classify(line: &str, dialect: LineDialect) -> LineEvent {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&last, head)) = tokens.split_last() else {
        return LineEvent::Ignored;
    };

    match last {
        "DOWN" if has_code(head, BTN_TOUCH, EV_KEY, dialect) => LineEvent::TouchDown,
        "UP" if has_code(head, BTN_TOUCH, EV_KEY, dialect) => LineEvent::TouchUp,
        value => {
            let Some(value) = parse_hex_value(value) else {
                return LineEvent::Ignored;
            };
            if has_axis_code(head, ABS_MT_POSITION_X, dialect) {
                LineEvent::XSample(value)
            } else if has_axis_code(head, ABS_MT_POSITION_Y, dialect) {
                LineEvent::YSample(value)
            } else {
                LineEvent::Ignored
            }
        }
    }
}

/// `head` ends with `[event_type] code` under the dialect's rules.
fn has_code(head: &[&str], code: &str, event_type: &str, dialect: LineDialect) -> bool {
    match head {
        [.., ty, c] if *c == code => dialect == LineDialect::Lenient || *ty == event_type,
        [c] if *c == code => dialect == LineDialect::Lenient,
        _ => false,
    }
}

fn has_axis_code(head: &[&str], code: &str, dialect: LineDialect) -> bool {
    match dialect {
        LineDialect::Strict => has_code(head, code, EV_ABS, dialect),
        LineDialect::Lenient => head.iter().any(|token| token.contains(code)),
    }
}

fn parse_hex_value(token: &str) -> Option<u32> {
    let well_formed = token.len() == HEX_DIGITS
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return None;
    }
    u32::from_str_radix(token, 16).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

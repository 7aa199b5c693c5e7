//! Touchscreen digitizers that report raw HID input.
//!
//! A report carries up to ten 5-byte touch slots, starting at byte 1. Each slot is a header byte
//! followed by the x and y coordinates as little-endian `u16`s, in device units spanning the whole
//! screen. The header holds the touch id plus one in its upper five bits and the contact state in
//! its lowest bit. A zero header ends the report.

use crate::host::Host;
use tracing::{trace, warn};

/// Number of touches a digitizer tracks at once.
pub const MAX_TOUCHES: usize = 10;

const FIRST_SLOT: usize = 1;
const SLOT_LEN: usize = 5;

/// A touch whose state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSample {
    /// Slot id, below [`MAX_TOUCHES`].
    pub id: u8,
    /// Whether the finger is in contact.
    pub pressed: bool,
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slot {
    pressed: bool,
    x: u16,
    y: u16,
}

/// Turns reports into samples, emitting only touches that changed since the last report.
#[derive(Debug, Default)]
pub struct ReportDecoder {
    slots: [Slot; MAX_TOUCHES],
}

impl ReportDecoder {
    pub fn new() -> ReportDecoder {
        ReportDecoder::default()
    }

    pub fn decode(&mut self, report: &[u8]) -> Vec<TouchSample> {
        let mut samples = Vec::new();
        let slots = report.get(FIRST_SLOT..).unwrap_or(&[]);
        for bytes in slots.chunks_exact(SLOT_LEN).take(MAX_TOUCHES) {
            let header = bytes[0];
            if header == 0 {
                break;
            }
            let id = match (header >> 3).checked_sub(1) {
                Some(id) if (id as usize) < MAX_TOUCHES => id,
                _ => {
                    warn!(header, "digitizer reported an out of range touch id");
                    continue;
                }
            };
            let slot = Slot {
                pressed: header & 1 == 1,
                x: u16::from_le_bytes([bytes[1], bytes[2]]),
                y: u16::from_le_bytes([bytes[3], bytes[4]]),
            };
            if self.slots[id as usize] != slot {
                self.slots[id as usize] = slot;
                samples.push(TouchSample {
                    id,
                    pressed: slot.pressed,
                    x: slot.x,
                    y: slot.y,
                });
            }
        }
        samples
    }
}

/// Feeds digitizer reports to a host until the stream ends. Usually run on its own thread, with
/// a device reader on the other end of a channel.
pub fn pump<I>(host: &Host, reports: I)
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut decoder = ReportDecoder::new();
    for report in reports {
        for sample in decoder.decode(report.as_ref()) {
            host.digitizer_sample(sample);
        }
    }
    trace!("digitizer report stream ended");
}

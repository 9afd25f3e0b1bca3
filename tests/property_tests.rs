//! Property tests for the frame codec, the step generator and the
//! driver-chip datagrams.

mod common;

use peristaltic_stepper::config::BoardConfig;
use peristaltic_stepper::driver::crc::{crc8, crc8_bitwise};
use peristaltic_stepper::driver::{Datagram, Register};
use peristaltic_stepper::protocol::{compute_checksum, Frame};
use peristaltic_stepper::{ChannelId, Ticks, TickEvent};
use proptest::prelude::*;

const MIN_PULSE: Ticks = Ticks(3);

/// Drive a started channel for `ticks` ticks from `start`, collecting
/// `(tick, event)` for every non-idle tick.
fn simulate(channel: &mut common::Channel, start: u32, ticks: u32) -> Vec<(u32, TickEvent)> {
    let mut events = Vec::new();
    for i in 0..ticks {
        let now = start.wrapping_add(i);
        let event = channel.tick(Ticks(now), MIN_PULSE, false).unwrap();
        if event != TickEvent::None {
            events.push((now, event));
        }
    }
    events
}

fn started(interval: u32, steps: u32, finite: bool, start: u32) -> (common::Channel, common::ChannelProbes) {
    let (mut channel, probes) = common::channel(ChannelId::M0, &BoardConfig::rp2350());
    channel.init().unwrap();
    channel.set_step_interval(Ticks(interval));
    channel.set_steps(steps);
    channel.set_finite_mode(finite);
    channel.set_running(Ticks(start), true).unwrap();
    (channel, probes)
}

proptest! {
    /// Checksum is the XOR of the first five bytes and validation accepts
    /// exactly that value.
    #[test]
    fn checksum_is_xor_fold(bytes in any::<[u8; 5]>(), check in any::<u8>()) {
        let xor = bytes.iter().fold(0, |acc, b| acc ^ b);
        prop_assert_eq!(compute_checksum(&bytes), xor);

        let mut raw = [0u8; 6];
        raw[..5].copy_from_slice(&bytes);
        raw[5] = check;
        prop_assert_eq!(Frame::from_bytes(raw).is_valid(), check == xor);
    }

    /// Every pulse stays high for at least the minimum width and drops
    /// before the next one is due; a finite move makes exactly its step
    /// count of pulses and reports completion once.
    #[test]
    fn finite_move_pulse_widths(
        interval in (MIN_PULSE.value() + 1)..400u32,
        steps in 1..20u32,
        start in any::<u32>(),
    ) {
        let (mut channel, probes) = started(interval, steps, true, start);
        let events = simulate(&mut channel, start, steps * interval + 2 * interval);

        let mut raised_at = None;
        let mut rises = 0;
        let mut completions = 0;
        for &(now, event) in &events {
            match event {
                TickEvent::StepRaised => {
                    prop_assert!(raised_at.is_none());
                    raised_at = Some(now);
                    rises += 1;
                }
                TickEvent::StepLowered => {
                    let high = now.wrapping_sub(raised_at.take().unwrap());
                    prop_assert!(high >= MIN_PULSE.value());
                    prop_assert!(high < interval);
                }
                TickEvent::MotionComplete => completions += 1,
                TickEvent::None => {}
            }
        }

        prop_assert_eq!(rises, steps);
        prop_assert_eq!(probes.step.rises(), steps);
        prop_assert_eq!(completions, 1);
        prop_assert!(!channel.is_running());
        prop_assert_eq!(channel.steps_remaining(), 0);
        prop_assert!(!probes.step.is_high());
    }

    /// Continuous mode spaces rising edges exactly one interval apart and
    /// never touches the step count.
    #[test]
    fn continuous_mode_spacing(
        interval in (MIN_PULSE.value() + 1)..200u32,
        steps in 1..1000u32,
        start in any::<u32>(),
    ) {
        let (mut channel, _) = started(interval, steps, false, start);
        let events = simulate(&mut channel, start, 30 * interval);

        let rises: Vec<u32> = events
            .iter()
            .filter(|(_, e)| *e == TickEvent::StepRaised)
            .map(|&(t, _)| t)
            .collect();
        prop_assert_eq!(rises.len(), 30);
        prop_assert_eq!(rises[0], start);
        for pair in rises.windows(2) {
            prop_assert_eq!(pair[1].wrapping_sub(pair[0]), interval);
        }
        prop_assert!(events.iter().all(|(_, e)| *e != TickEvent::MotionComplete));
        prop_assert_eq!(channel.steps_remaining(), steps);
        prop_assert!(channel.is_running());
    }

    /// Re-asserting the running state leaves the pulse, the last edge and
    /// the step output alone.
    #[test]
    fn set_running_is_idempotent(
        interval in (MIN_PULSE.value() + 1)..200u32,
        elapsed in 0..1000u32,
        later in any::<u32>(),
    ) {
        let (mut channel, probes) = started(interval, 1000, true, 0);
        simulate(&mut channel, 0, elapsed);
        let before = (channel.is_pulse_high(), channel.last_edge(), probes.step.is_high(), channel.steps_remaining());

        channel.set_running(Ticks(later), true).unwrap();

        let after = (channel.is_pulse_high(), channel.last_edge(), probes.step.is_high(), channel.steps_remaining());
        prop_assert_eq!(before, after);
    }

    /// The lookup-table CRC agrees with the bit-by-bit reference.
    #[test]
    fn crc_table_matches_bitwise(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
        prop_assert_eq!(crc8(&bytes), crc8_bitwise(&bytes));
    }

    /// Write datagrams carry the value big-endian behind sync, address and
    /// the flagged register, then the CRC of those seven bytes.
    #[test]
    fn datagram_layout(address in 0..4u8, value in any::<u32>()) {
        let datagram = Datagram::write(address, Register::Chopconf, value);
        let bytes = datagram.as_bytes();

        prop_assert_eq!(bytes[0], 0x05);
        prop_assert_eq!(bytes[1], address);
        prop_assert_eq!(bytes[2], 0x6C | 0x80);
        prop_assert_eq!(&bytes[3..7], &value.to_be_bytes()[..]);
        prop_assert_eq!(bytes[7], crc8_bitwise(&bytes[..7]));
        prop_assert!(datagram.is_valid());
        prop_assert_eq!(datagram.value(), value);
    }
}

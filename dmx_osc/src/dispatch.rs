//! Address dispatch: OSC packets into universe mutations.

use log::debug;
use rosc::{OscMessage, OscPacket, OscType};

use dmx_universe::{Universe, CHANNEL_COUNT, PRIORITY_COUNT};

use crate::{pattern::matching_numbers, schedule::TimetagScheduler, timetag::Timetag};

/// First address component of every message the bridge handles.
const ROOT: &str = "dmx";

/// Routes one decoded packet.
///
/// Bundles recurse per element with the bundle's time-tag. Messages
/// tagged immediate mutate the universe now; anything else waits in
/// the scheduler until the emitter drains it (a tag already in the
/// past drains on the same tick).
pub fn dispatch_packet(
    universe: &mut Universe,
    scheduler: &mut TimetagScheduler,
    packet: OscPacket,
    timetag: Timetag,
) {
    match packet {
        OscPacket::Bundle(bundle) => {
            let timetag = Timetag::from(bundle.timetag);
            for element in bundle.content {
                dispatch_packet(universe, scheduler, element, timetag);
            }
        }
        OscPacket::Message(msg) => match timetag {
            Timetag::Immediate => apply_message(universe, &msg),
            Timetag::At(due) => scheduler.enqueue(due, msg),
        },
    }
}

/// Applies one message to the universe.
///
/// The address must tokenise to `/dmx/<channel>/<priority>`; both
/// numeric components may carry `*`/`?` wildcards and expand to
/// every matching value in range. An `int32` first argument sets
/// the addressed candidates to its low 8 bits; any other argument
/// list clears them. Anything malformed or out of range is ignored
/// without partial mutation.
pub fn apply_message(universe: &mut Universe, msg: &OscMessage) {
    let parts: Vec<&str> = msg.addr.split('/').filter(|part| !part.is_empty()).collect();

    let (channel_pattern, priority_pattern) = match parts.as_slice() {
        [ROOT, channel, priority] => (*channel, *priority),
        _ => {
            debug!("ignoring address outside /dmx tree: {}", msg.addr);
            return;
        }
    };

    let channels = matching_numbers(channel_pattern, CHANNEL_COUNT as u16);
    let priorities = matching_numbers(priority_pattern, PRIORITY_COUNT as u16);
    if channels.is_empty() || priorities.is_empty() {
        debug!("no channel/priority matches address: {}", msg.addr);
        return;
    }

    // Only the first argument decides; later arguments are ignored.
    let value = match msg.args.first() {
        Some(OscType::Int(i)) => Some((i & 0xff) as u8),
        _ => None,
    };

    match value {
        Some(value) => {
            for &channel in &channels {
                for &priority in &priorities {
                    universe.slot_mut(channel).set(priority as u8, value);
                }
            }
            debug!(
                "SET {} channel(s) x {} priority(ies) to {}",
                channels.len(),
                priorities.len(),
                value
            );
        }
        None => {
            for &channel in &channels {
                for &priority in &priorities {
                    universe.slot_mut(channel).clear(priority as u8);
                }
            }
            debug!(
                "CLEAR {} channel(s) x {} priority(ies)",
                channels.len(),
                priorities.len()
            );
        }
    }
}

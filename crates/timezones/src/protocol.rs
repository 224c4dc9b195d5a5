//! Play-state packets used to patch a single client's environment

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::time::WorldState;

pub mod packet_ids {
    /// Clientbound SetTime
    pub const SET_TIME: i32 = 111;
    /// Clientbound GameEvent
    pub const GAME_EVENT: i32 = 38;
}

/// Game event codes understood by the client.
pub mod game_events {
    pub const END_RAINING: u8 = 1;
    pub const BEGIN_RAINING: u8 = 2;
    pub const RAIN_LEVEL_CHANGE: u8 = 7;
    pub const THUNDER_LEVEL_CHANGE: u8 = 8;
}

pub fn write_varint<W: Write>(writer: &mut W, mut value: i32) -> Result<()> {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u32) >> 7) as i32;
        if value != 0 {
            byte |= 0x80;
        }
        writer.write_u8(byte)?;
        if value == 0 {
            break;
        }
    }
    Ok(())
}

/// Encode a packet with ID and data into a length-prefixed packet
pub fn encode_packet(packet_id: i32, data: &[u8]) -> Result<Bytes> {
    let mut packet_id_bytes = Vec::new();
    write_varint(&mut packet_id_bytes, packet_id)?;

    let length = packet_id_bytes.len() + data.len();
    let mut length_bytes = Vec::new();
    write_varint(&mut length_bytes, length as i32)?;

    let mut buf = BytesMut::with_capacity(length_bytes.len() + length);
    buf.put_slice(&length_bytes);
    buf.put_slice(&packet_id_bytes);
    buf.put_slice(data);
    Ok(buf.freeze())
}

/// `tick_day_time = false` freezes the client's clock at `time_of_day`.
pub fn create_set_time(world_age: i64, time_of_day: i64, tick_day_time: bool) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(17);
    data.write_i64::<BigEndian>(world_age)?;
    data.write_i64::<BigEndian>(time_of_day)?;
    data.write_u8(u8::from(tick_day_time))?;
    Ok(data)
}

pub fn create_game_event(event: u8, value: f32) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(5);
    data.write_u8(event)?;
    data.write_f32::<BigEndian>(value)?;
    Ok(data)
}

pub fn set_time_packet(world_age: i64, time_of_day: i64, tick_day_time: bool) -> Result<Bytes> {
    encode_packet(
        packet_ids::SET_TIME,
        &create_set_time(world_age, time_of_day, tick_day_time)?,
    )
}

pub fn game_event_packet(event: u8, value: f32) -> Result<Bytes> {
    encode_packet(packet_ids::GAME_EVENT, &create_game_event(event, value)?)
}

/// Frozen clock at `time_of_day` with fog and rain cleared.
pub fn overridden_environment(world_age: i64, time_of_day: i64) -> Result<Vec<Bytes>> {
    Ok(vec![
        set_time_packet(world_age, time_of_day, false)?,
        game_event_packet(game_events::END_RAINING, 0.0)?,
        game_event_packet(game_events::RAIN_LEVEL_CHANGE, 0.0)?,
        game_event_packet(game_events::THUNDER_LEVEL_CHANGE, 0.0)?,
    ])
}

/// The shared clock and weather, as every unpatched client sees them.
pub fn world_environment(world: &WorldState) -> Result<Vec<Bytes>> {
    let raining = if world.is_raining() {
        game_events::BEGIN_RAINING
    } else {
        game_events::END_RAINING
    };
    Ok(vec![
        set_time_packet(world.world_age, world.time_of_day, true)?,
        game_event_packet(raining, 0.0)?,
        game_event_packet(game_events::RAIN_LEVEL_CHANGE, world.rain_level)?,
        game_event_packet(game_events::THUNDER_LEVEL_CHANGE, world.thunder_level)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint() {
        let cases: [(i32, &[u8]); 5] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (111, &[0x6F]),
            (300, &[0xAC, 0x02]),
            (-1, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];
        for (value, expected) in cases {
            let mut buf = Vec::new();
            write_varint(&mut buf, value).unwrap();
            assert_eq!(buf, expected, "varint {value}");
        }
    }

    #[test]
    fn test_set_time_layout() {
        let packet = set_time_packet(5, 9000, false).unwrap();

        // length, id, world_age, time_of_day, tick flag
        assert_eq!(packet.len(), 1 + 1 + 8 + 8 + 1);
        assert_eq!(packet[0], 18);
        assert_eq!(packet[1], 111);
        assert_eq!(&packet[2..10], &5i64.to_be_bytes());
        assert_eq!(&packet[10..18], &9000i64.to_be_bytes());
        assert_eq!(packet[18], 0);
    }

    #[test]
    fn test_game_event_layout() {
        let packet = game_event_packet(game_events::RAIN_LEVEL_CHANGE, 1.0).unwrap();
        assert_eq!(packet[0], 6);
        assert_eq!(packet[1], 38);
        assert_eq!(packet[2], 7);
        assert_eq!(&packet[3..7], &1.0f32.to_be_bytes());
    }

    #[test]
    fn test_world_environment_ticks_clock() {
        let world = WorldState {
            world_age: 100,
            time_of_day: 13000,
            rain_level: 1.0,
            thunder_level: 0.0,
        };
        let packets = world_environment(&world).unwrap();
        assert_eq!(packets.len(), 4);
        assert_eq!(packets[0][18], 1);
        assert_eq!(packets[1][2], game_events::BEGIN_RAINING);
    }
}

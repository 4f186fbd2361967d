use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;
use thiserror::Error;

/// Resolved per-stage configuration.
///
/// A `.prm` file overrides individual fields; everything it does not mention
/// keeps the hard default below, so a sparse file is valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageParams {
    pub is_ex_stage: bool,
    pub is_diving_stage: bool,
    pub is_option_stage: bool,
    pub is_multiplayer_stage: bool,
    pub is_egg_free: bool,
    pub player_has_fludd: bool,
    pub player_has_helmet: bool,
    pub player_has_glasses: bool,
    pub player_has_shirt: bool,
    pub player_can_ride_yoshi: bool,
    pub music_enabled: bool,
    pub music_set_custom: bool,
    pub music_id: u16,
    pub music_area_id: u8,
    pub music_episode_id: u8,
    pub music_pitch: f32,
    pub music_speed: f32,
    pub music_volume: f32,
    /// True only when the values came from an on-disc `.prm` file.
    pub custom_config_loaded: bool,
}

impl Default for StageParams {
    fn default() -> Self {
        StageParams {
            is_ex_stage: false,
            is_diving_stage: false,
            is_option_stage: false,
            is_multiplayer_stage: false,
            is_egg_free: true,
            player_has_fludd: true,
            player_has_helmet: false,
            player_has_glasses: false,
            player_has_shirt: false,
            player_can_ride_yoshi: true,
            music_enabled: true,
            music_set_custom: false,
            music_id: 1,
            music_area_id: 1,
            music_episode_id: 1,
            music_pitch: 1.0,
            music_speed: 1.0,
            music_volume: 0.75,
            custom_config_loaded: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrmError {
    #[error("parameter record truncated at offset {offset} (need {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },
    #[error("keycode {keycode:#06x} carries {actual} payload bytes, expected {expected}")]
    PayloadLength {
        keycode: u16,
        expected: usize,
        actual: usize,
    },
}

// Field keycodes use the classic name hash (h = h*3 + byte) over the field
// name, so files authored against other builds of the runtime stay readable.
const fn keycode(name: &str) -> u16 {
    let bytes = name.as_bytes();
    let mut hash: u16 = 0;
    let mut i = 0;
    while i < bytes.len() {
        hash = hash.wrapping_mul(3).wrapping_add(bytes[i] as u16);
        i += 1;
    }
    hash
}

pub const KEY_IS_EX_STAGE: u16 = keycode("IsExStage");
pub const KEY_IS_DIVING_STAGE: u16 = keycode("IsDivingStage");
pub const KEY_IS_OPTION_STAGE: u16 = keycode("IsOptionStage");
pub const KEY_IS_MULTIPLAYER_STAGE: u16 = keycode("IsMultiplayerStage");
pub const KEY_IS_EGG_FREE: u16 = keycode("IsEggFree");
pub const KEY_PLAYER_HAS_FLUDD: u16 = keycode("PlayerHasFludd");
pub const KEY_PLAYER_HAS_HELMET: u16 = keycode("PlayerHasHelmet");
pub const KEY_PLAYER_HAS_GLASSES: u16 = keycode("PlayerHasGlasses");
pub const KEY_PLAYER_HAS_SHIRT: u16 = keycode("PlayerHasShirt");
pub const KEY_PLAYER_CAN_RIDE_YOSHI: u16 = keycode("PlayerCanRideYoshi");
pub const KEY_MUSIC_ENABLED: u16 = keycode("MusicEnabled");
pub const KEY_MUSIC_SET_CUSTOM: u16 = keycode("MusicSetCustom");
pub const KEY_MUSIC_ID: u16 = keycode("MusicID");
pub const KEY_MUSIC_AREA_ID: u16 = keycode("MusicAreaID");
pub const KEY_MUSIC_EPISODE_ID: u16 = keycode("MusicEpisodeID");
pub const KEY_MUSIC_PITCH: u16 = keycode("MusicPitch");
pub const KEY_MUSIC_SPEED: u16 = keycode("MusicSpeed");
pub const KEY_MUSIC_VOLUME: u16 = keycode("MusicVolume");

const RECORD_HEADER: usize = 4;

impl StageParams {
    /// Decodes a `.prm` blob. Records are `[u16 keycode][u16 len][payload]`,
    /// big-endian. Unknown keycodes are skipped.
    pub fn decode(bytes: &[u8]) -> Result<StageParams, PrmError> {
        let mut params = StageParams::default();
        let mut offset = 0;

        while offset < bytes.len() {
            if bytes.len() - offset < RECORD_HEADER {
                return Err(PrmError::Truncated {
                    offset,
                    needed: RECORD_HEADER - (bytes.len() - offset),
                });
            }
            let key = BigEndian::read_u16(&bytes[offset..offset + 2]);
            let len = BigEndian::read_u16(&bytes[offset + 2..offset + 4]) as usize;
            let payload_start = offset + RECORD_HEADER;
            if bytes.len() - payload_start < len {
                return Err(PrmError::Truncated {
                    offset: payload_start,
                    needed: len - (bytes.len() - payload_start),
                });
            }
            let payload = &bytes[payload_start..payload_start + len];
            params.apply_record(key, payload)?;
            offset = payload_start + len;
        }

        Ok(params)
    }

    fn apply_record(&mut self, key: u16, payload: &[u8]) -> Result<(), PrmError> {
        match key {
            KEY_IS_EX_STAGE => self.is_ex_stage = read_bool(key, payload)?,
            KEY_IS_DIVING_STAGE => self.is_diving_stage = read_bool(key, payload)?,
            KEY_IS_OPTION_STAGE => self.is_option_stage = read_bool(key, payload)?,
            KEY_IS_MULTIPLAYER_STAGE => self.is_multiplayer_stage = read_bool(key, payload)?,
            KEY_IS_EGG_FREE => self.is_egg_free = read_bool(key, payload)?,
            KEY_PLAYER_HAS_FLUDD => self.player_has_fludd = read_bool(key, payload)?,
            KEY_PLAYER_HAS_HELMET => self.player_has_helmet = read_bool(key, payload)?,
            KEY_PLAYER_HAS_GLASSES => self.player_has_glasses = read_bool(key, payload)?,
            KEY_PLAYER_HAS_SHIRT => self.player_has_shirt = read_bool(key, payload)?,
            KEY_PLAYER_CAN_RIDE_YOSHI => self.player_can_ride_yoshi = read_bool(key, payload)?,
            KEY_MUSIC_ENABLED => self.music_enabled = read_bool(key, payload)?,
            KEY_MUSIC_SET_CUSTOM => self.music_set_custom = read_bool(key, payload)?,
            KEY_MUSIC_ID => self.music_id = read_u16(key, payload)?,
            KEY_MUSIC_AREA_ID => self.music_area_id = read_u8(key, payload)?,
            KEY_MUSIC_EPISODE_ID => self.music_episode_id = read_u8(key, payload)?,
            KEY_MUSIC_PITCH => self.music_pitch = read_f32(key, payload)?,
            KEY_MUSIC_SPEED => self.music_speed = read_f32(key, payload)?,
            KEY_MUSIC_VOLUME => self.music_volume = read_f32(key, payload)?,
            // Fields owned by other patches ride along in the same file.
            _ => {}
        }
        Ok(())
    }

    /// Encodes every field in canonical order. Round-trips through `decode`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_bool(&mut out, KEY_IS_EX_STAGE, self.is_ex_stage);
        push_bool(&mut out, KEY_IS_DIVING_STAGE, self.is_diving_stage);
        push_bool(&mut out, KEY_IS_OPTION_STAGE, self.is_option_stage);
        push_bool(&mut out, KEY_IS_MULTIPLAYER_STAGE, self.is_multiplayer_stage);
        push_bool(&mut out, KEY_IS_EGG_FREE, self.is_egg_free);
        push_bool(&mut out, KEY_PLAYER_HAS_FLUDD, self.player_has_fludd);
        push_bool(&mut out, KEY_PLAYER_HAS_HELMET, self.player_has_helmet);
        push_bool(&mut out, KEY_PLAYER_HAS_GLASSES, self.player_has_glasses);
        push_bool(&mut out, KEY_PLAYER_HAS_SHIRT, self.player_has_shirt);
        push_bool(&mut out, KEY_PLAYER_CAN_RIDE_YOSHI, self.player_can_ride_yoshi);
        push_bool(&mut out, KEY_MUSIC_ENABLED, self.music_enabled);
        push_bool(&mut out, KEY_MUSIC_SET_CUSTOM, self.music_set_custom);
        push_u16(&mut out, KEY_MUSIC_ID, self.music_id);
        push_u8(&mut out, KEY_MUSIC_AREA_ID, self.music_area_id);
        push_u8(&mut out, KEY_MUSIC_EPISODE_ID, self.music_episode_id);
        push_f32(&mut out, KEY_MUSIC_PITCH, self.music_pitch);
        push_f32(&mut out, KEY_MUSIC_SPEED, self.music_speed);
        push_f32(&mut out, KEY_MUSIC_VOLUME, self.music_volume);
        out
    }
}

fn expect_len(key: u16, payload: &[u8], expected: usize) -> Result<(), PrmError> {
    if payload.len() != expected {
        return Err(PrmError::PayloadLength {
            keycode: key,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn read_bool(key: u16, payload: &[u8]) -> Result<bool, PrmError> {
    expect_len(key, payload, 1)?;
    Ok(payload[0] != 0)
}

fn read_u8(key: u16, payload: &[u8]) -> Result<u8, PrmError> {
    expect_len(key, payload, 1)?;
    Ok(payload[0])
}

fn read_u16(key: u16, payload: &[u8]) -> Result<u16, PrmError> {
    expect_len(key, payload, 2)?;
    Ok(BigEndian::read_u16(payload))
}

fn read_f32(key: u16, payload: &[u8]) -> Result<f32, PrmError> {
    expect_len(key, payload, 4)?;
    Ok(BigEndian::read_f32(payload))
}

fn push_header(out: &mut Vec<u8>, key: u16, len: u16) {
    let mut header = [0u8; 4];
    BigEndian::write_u16(&mut header[0..2], key);
    BigEndian::write_u16(&mut header[2..4], len);
    out.extend_from_slice(&header);
}

fn push_bool(out: &mut Vec<u8>, key: u16, value: bool) {
    push_header(out, key, 1);
    out.push(value as u8);
}

fn push_u8(out: &mut Vec<u8>, key: u16, value: u8) {
    push_header(out, key, 1);
    out.push(value);
}

fn push_u16(out: &mut Vec<u8>, key: u16, value: u16) {
    push_header(out, key, 2);
    let mut buf = [0u8; 2];
    BigEndian::write_u16(&mut buf, value);
    out.extend_from_slice(&buf);
}

fn push_f32(out: &mut Vec<u8>, key: u16, value: f32) {
    push_header(out, key, 4);
    let mut buf = [0u8; 4];
    BigEndian::write_f32(&mut buf, value);
    out.extend_from_slice(&buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        push_header(&mut bytes, key, payload.len() as u16);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn defaults_match_hard_reset_values() {
        let params = StageParams::default();
        assert!(!params.is_ex_stage);
        assert!(!params.is_diving_stage);
        assert!(!params.is_option_stage);
        assert!(!params.is_multiplayer_stage);
        assert!(params.is_egg_free);
        assert!(params.player_has_fludd);
        assert!(!params.player_has_helmet);
        assert!(!params.player_has_glasses);
        assert!(!params.player_has_shirt);
        assert!(params.player_can_ride_yoshi);
        assert!(params.music_enabled);
        assert!(!params.music_set_custom);
        assert_eq!(params.music_id, 1);
        assert_eq!(params.music_area_id, 1);
        assert_eq!(params.music_episode_id, 1);
        assert_eq!(params.music_pitch, 1.0);
        assert_eq!(params.music_speed, 1.0);
        assert_eq!(params.music_volume, 0.75);
        assert!(!params.custom_config_loaded);
    }

    #[test]
    fn sparse_record_overrides_only_named_fields() {
        let mut bytes = record(KEY_IS_EX_STAGE, &[1]);
        bytes.extend(record(KEY_MUSIC_VOLUME, &0.5f32.to_be_bytes()));

        let params = StageParams::decode(&bytes).unwrap();
        assert!(params.is_ex_stage);
        assert_eq!(params.music_volume, 0.5);
        // Untouched fields keep their defaults.
        assert!(params.player_has_fludd);
        assert_eq!(params.music_id, 1);
    }

    #[test]
    fn unknown_keycodes_are_skipped() {
        let mut bytes = record(0xBEEF, &[9, 9, 9, 9, 9, 9]);
        bytes.extend(record(KEY_PLAYER_HAS_HELMET, &[1]));

        let params = StageParams::decode(&bytes).unwrap();
        assert!(params.player_has_helmet);
    }

    #[test]
    fn truncated_header_is_an_error() {
        let err = StageParams::decode(&[0x87]).unwrap_err();
        assert!(matches!(err, PrmError::Truncated { offset: 0, .. }));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut bytes = Vec::new();
        push_header(&mut bytes, KEY_MUSIC_PITCH, 4);
        bytes.extend_from_slice(&[0x3F, 0x80]);

        let err = StageParams::decode(&bytes).unwrap_err();
        assert!(matches!(err, PrmError::Truncated { needed: 2, .. }));
    }

    #[test]
    fn wrong_payload_length_for_known_key_is_an_error() {
        let bytes = record(KEY_MUSIC_ID, &[0, 0, 1]);
        let err = StageParams::decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            PrmError::PayloadLength {
                keycode: KEY_MUSIC_ID,
                expected: 2,
                actual: 3,
            }
        );
    }

    #[test]
    fn encode_round_trips() {
        let mut params = StageParams::default();
        params.is_diving_stage = true;
        params.player_can_ride_yoshi = false;
        params.music_id = 42;
        params.music_pitch = 1.25;

        let decoded = StageParams::decode(&params.encode()).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn empty_blob_decodes_to_defaults() {
        assert_eq!(StageParams::decode(&[]).unwrap(), StageParams::default());
    }
}

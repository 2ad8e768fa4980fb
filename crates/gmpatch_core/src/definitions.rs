//! Portable definition records for archive entities.
//!
//! Each record round-trips to/from JSON (field names are part of the on-disk
//! format and must not change) and converts to/from its archive-native entity.
//! Script and sprite definitions are created during generation for entities
//! that exist only in the modded archive, and consumed during application to
//! re-insert those entities into the target.

use crate::archive::{
    Archive, ObjectEntry, PlaybackType, ScriptEntry, SpriteEntry, SpriteFrame,
};
use crate::error::{Error, Result};
use crate::import::CodeImportGroup;
use serde::{Deserialize, Serialize};

/// Alias record mapping a named script to its compiled code entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDefinition {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Code")]
    pub code: String,
}

impl ScriptDefinition {
    pub fn from_entry(entry: &ScriptEntry) -> Self {
        Self {
            name: entry.name.clone(),
            code: entry.code_entry.clone(),
        }
    }

    /// Convert back into an archive entity. The referenced code entry must
    /// resolve in the target archive or among replacements queued for import.
    pub fn to_entry(&self, archive: &Archive, pending: &CodeImportGroup) -> Result<ScriptEntry> {
        if archive.code_by_name(&self.code).is_none() && !pending.contains(&self.code) {
            return Err(Error::InvalidDefinition {
                kind: "script",
                name: self.name.clone(),
                reason: format!("code entry '{}' does not exist", self.code),
            });
        }

        Ok(ScriptEntry {
            name: self.name.clone(),
            code_entry: self.code.clone(),
        })
    }
}

/// Sprite metadata record. The placement list on the resulting entity is
/// populated only after atlas packing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteDefinition {
    #[serde(rename = "Name")]
    pub name: String,
    /// Image file name relative to the definition's folder. Multi-frame
    /// sprites are horizontal filmstrips of `FrameCount` frames.
    #[serde(rename = "ImageFile")]
    pub image_file: String,
    #[serde(rename = "FrameCount")]
    pub frame_count: u32,
    /// Width, height of one frame in pixels.
    #[serde(rename = "Size")]
    pub size: [u32; 2],
    /// Left, right, bottom, top.
    #[serde(rename = "Margins")]
    pub margins: [i32; 4],
    #[serde(rename = "BoundingBoxMode")]
    pub bounding_box_mode: u32,
    #[serde(rename = "Origin")]
    pub origin: [i32; 2],
    #[serde(rename = "playbackSpeed")]
    pub playback_speed: f32,
    #[serde(rename = "playbackType")]
    pub playback_type: PlaybackType,
}

impl SpriteDefinition {
    pub fn from_entry(entry: &SpriteEntry, image_file: String) -> Self {
        Self {
            name: entry.name.clone(),
            image_file,
            frame_count: entry.frames.len().max(1) as u32,
            size: [entry.width, entry.height],
            margins: entry.margins,
            bounding_box_mode: entry.bbox_mode,
            origin: entry.origin,
            playback_speed: entry.playback_speed,
            playback_type: entry.playback_type,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidDefinition {
            kind: "sprite",
            name: self.name.clone(),
            reason,
        };

        if self.frame_count < 1 {
            return Err(invalid("FrameCount must be at least 1".to_string()));
        }
        if self.size[0] == 0 || self.size[1] == 0 {
            return Err(invalid(format!(
                "frame size {}x{} is empty",
                self.size[0], self.size[1]
            )));
        }
        Ok(())
    }

    /// Build the archive entity, binding the packed frame placements.
    pub fn to_entry(&self, frames: Vec<SpriteFrame>) -> SpriteEntry {
        SpriteEntry {
            name: self.name.clone(),
            width: self.size[0],
            height: self.size[1],
            margins: self.margins,
            bbox_mode: self.bounding_box_mode,
            origin: self.origin,
            playback_speed: self.playback_speed,
            playback_type: self.playback_type,
            frames,
        }
    }
}

/// Pass-through record for a game object; the event table is opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObjectDefinition {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CollisionShape")]
    pub collision_shape: String,
    #[serde(rename = "Events")]
    pub events: serde_json::Value,
}

impl GameObjectDefinition {
    pub fn from_entry(entry: &ObjectEntry) -> Self {
        Self {
            name: entry.name.clone(),
            collision_shape: entry.collision_shape.clone(),
            events: entry.events.clone(),
        }
    }

    pub fn to_entry(&self) -> ObjectEntry {
        ObjectEntry {
            name: self.name.clone(),
            collision_shape: self.collision_shape.clone(),
            events: self.events.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::CodeEntry;
    use serde_json::json;

    #[test]
    fn script_definition_json_field_names() {
        let def = ScriptDefinition {
            name: "scr_new".to_string(),
            code: "gml_GlobalScript_scr_new".to_string(),
        };

        let text = serde_json::to_string(&def).unwrap();
        assert_eq!(
            text,
            r#"{"Name":"scr_new","Code":"gml_GlobalScript_scr_new"}"#
        );
        assert_eq!(serde_json::from_str::<ScriptDefinition>(&text).unwrap(), def);
    }

    #[test]
    fn script_definition_requires_resolvable_code() {
        let def = ScriptDefinition {
            name: "scr_new".to_string(),
            code: "gml_GlobalScript_scr_new".to_string(),
        };

        let empty = Archive::default();
        let no_pending = CodeImportGroup::new();
        assert!(matches!(
            def.to_entry(&empty, &no_pending),
            Err(Error::InvalidDefinition { kind: "script", .. })
        ));

        // Resolves against an existing entry.
        let mut archive = Archive::default();
        archive.code.push(CodeEntry {
            name: "gml_GlobalScript_scr_new".to_string(),
            parent: None,
            source: String::new(),
        });
        assert!(def.to_entry(&archive, &no_pending).is_ok());

        // Also resolves against a replacement queued in the same run.
        let mut pending = CodeImportGroup::new();
        pending
            .queue_replace(&archive, "gml_GlobalScript_scr_new", "x = 1".to_string())
            .unwrap();
        assert!(def.to_entry(&Archive::default(), &pending).is_ok());
    }

    fn sample_sprite() -> SpriteDefinition {
        SpriteDefinition {
            name: "spr_test".to_string(),
            image_file: "spr_test.png".to_string(),
            frame_count: 2,
            size: [16, 16],
            margins: [0, 15, 15, 0],
            bounding_box_mode: 0,
            origin: [8, 8],
            playback_speed: 15.0,
            playback_type: PlaybackType::FramesPerSecond,
        }
    }

    #[test]
    fn sprite_definition_json_schema() {
        let value = serde_json::to_value(sample_sprite()).unwrap();
        assert_eq!(
            value,
            json!({
                "Name": "spr_test",
                "ImageFile": "spr_test.png",
                "FrameCount": 2,
                "Size": [16, 16],
                "Margins": [0, 15, 15, 0],
                "BoundingBoxMode": 0,
                "Origin": [8, 8],
                "playbackSpeed": 15.0,
                "playbackType": "frames-per-second",
            })
        );
    }

    #[test]
    fn sprite_validation_rejects_degenerate_sizes() {
        let mut def = sample_sprite();
        def.frame_count = 0;
        assert!(def.validate().is_err());

        let mut def = sample_sprite();
        def.size = [0, 16];
        assert!(def.validate().is_err());

        assert!(sample_sprite().validate().is_ok());
    }

    #[test]
    fn game_object_events_pass_through_unchanged() {
        let events = json!({"Create": [{"action": 603}], "Step": []});
        let def = GameObjectDefinition {
            name: "obj_test".to_string(),
            collision_shape: "rectangle".to_string(),
            events: events.clone(),
        };

        let entry = def.to_entry();
        assert_eq!(entry.events, events);
        assert_eq!(GameObjectDefinition::from_entry(&entry), def);
    }
}

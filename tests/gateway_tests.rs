// Tests for gateway dispatch translation and the voice state cache
//
// VOICE_STATE_UPDATE only carries the new state, so these tests check that
// the previous channel and member come from what the cache saw earlier.

use anyhow::Result;
use serde_json::json;
use voice_call_tracker::discord::models::{Channel, User, INTENTS};
use voice_call_tracker::discord::{EventTranslator, GatewayEvent};
use voice_call_tracker::tracker::{classify, AccountKind, Transition, VoicePresenceEvent};

fn voice_update(user_id: &str, channel_id: Option<&str>) -> serde_json::Value {
    json!({
        "guild_id": "900",
        "channel_id": channel_id,
        "user_id": user_id,
        "session_id": "abc",
        "deaf": false,
        "mute": false,
        "self_deaf": false,
        "self_mute": false,
        "self_video": false,
        "suppress": false,
        "member": {
            "user": {
                "id": user_id,
                "username": "alice",
                "discriminator": "0",
                "global_name": "Alice",
                "avatar": "abc123",
                "bot": false
            },
            "nick": null,
            "roles": [],
            "joined_at": "2024-01-01T00:00:00+00:00"
        }
    })
}

fn presence(mut events: Vec<GatewayEvent>) -> VoicePresenceEvent {
    assert_eq!(events.len(), 1, "expected one event, got {:?}", events);
    match events.remove(0) {
        GatewayEvent::VoiceStateChanged(event) => event,
        other => panic!("expected voice state change, got {:?}", other),
    }
}

fn guild_create(voice_states: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "900",
        "name": "test guild",
        "voice_states": voice_states,
        "members": [
            {
                "user": { "id": "77", "username": "carol", "discriminator": "0" },
                "nick": "Caz"
            }
        ]
    })
}

#[test]
fn test_ready_reports_user_tag() -> Result<()> {
    let mut translator = EventTranslator::new();
    let event = translator.translate(
        "READY",
        json!({
            "v": 10,
            "user": { "id": "1", "username": "tracker", "discriminator": "0", "bot": true },
            "guilds": [],
            "session_id": "s"
        }),
    )?;

    match event.as_slice() {
        [GatewayEvent::Ready { user_tag }] => assert_eq!(user_tag, "tracker"),
        other => panic!("expected ready, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_join_then_leave_tracks_previous_channel() -> Result<()> {
    let mut translator = EventTranslator::new();

    let joined = presence(translator.translate("VOICE_STATE_UPDATE", voice_update("42", Some("123")))?);
    assert_eq!(joined.previous_channel_id, None);
    assert_eq!(joined.next_channel_id.as_deref(), Some("123"));
    assert_eq!(
        classify(joined.previous_channel_id.as_deref(), joined.next_channel_id.as_deref()),
        Transition::Join
    );
    assert_eq!(translator.cache().len(), 1);

    let left = presence(translator.translate("VOICE_STATE_UPDATE", voice_update("42", None))?);
    assert_eq!(left.previous_channel_id.as_deref(), Some("123"));
    assert_eq!(left.next_channel_id, None);
    assert!(left.member_before.is_some());
    assert!(translator.cache().is_empty());
    Ok(())
}

#[test]
fn test_guild_create_seeds_existing_members() -> Result<()> {
    let mut translator = EventTranslator::new();
    let seeded = translator.translate(
        "GUILD_CREATE",
        guild_create(json!([
            { "channel_id": "555", "user_id": "42", "session_id": "x" }
        ])),
    )?;
    // The first seed of a guild reports nothing
    assert!(seeded.is_empty());

    // Already connected before startup: the first update is a leave, not a join
    let left = presence(translator.translate("VOICE_STATE_UPDATE", voice_update("42", None))?);
    assert_eq!(left.previous_channel_id.as_deref(), Some("555"));
    assert_eq!(left.member_before, None);
    assert!(left.member_after.is_some());
    Ok(())
}

#[test]
fn test_move_between_channels() -> Result<()> {
    let mut translator = EventTranslator::new();
    translator.translate("VOICE_STATE_UPDATE", voice_update("42", Some("1")))?;

    let moved = presence(translator.translate("VOICE_STATE_UPDATE", voice_update("42", Some("2")))?);
    assert_eq!(
        classify(moved.previous_channel_id.as_deref(), moved.next_channel_id.as_deref()),
        Transition::Move
    );
    Ok(())
}

#[test]
fn test_guild_delete_forgets_voice_states() -> Result<()> {
    let mut translator = EventTranslator::new();
    translator.translate("VOICE_STATE_UPDATE", voice_update("42", Some("1")))?;
    translator.translate("GUILD_DELETE", json!({ "id": "900" }))?;

    assert!(translator.cache().is_empty());
    Ok(())
}

#[test]
fn test_guild_outage_keeps_voice_states() -> Result<()> {
    let mut translator = EventTranslator::new();
    translator.translate("VOICE_STATE_UPDATE", voice_update("42", Some("1")))?;
    translator.translate("GUILD_DELETE", json!({ "id": "900", "unavailable": true }))?;

    assert_eq!(translator.cache().len(), 1);
    Ok(())
}

#[test]
fn test_reseed_reports_leave_missed_while_disconnected() -> Result<()> {
    let mut translator = EventTranslator::new();
    translator.translate("GUILD_CREATE", guild_create(json!([])))?;
    translator.translate("VOICE_STATE_UPDATE", voice_update("42", Some("1")))?;

    // Reconnected: 42 is gone from the fresh voice state list
    let left = presence(translator.translate("GUILD_CREATE", guild_create(json!([])))?);

    assert_eq!(left.user_id, "42");
    assert_eq!(left.previous_channel_id.as_deref(), Some("1"));
    assert_eq!(left.next_channel_id, None);
    assert_eq!(left.participant().unwrap().display_name, "Alice");
    assert_eq!(
        classify(left.previous_channel_id.as_deref(), left.next_channel_id.as_deref()),
        Transition::Leave
    );
    assert!(translator.cache().is_empty());
    Ok(())
}

#[test]
fn test_reseed_reports_join_missed_while_disconnected() -> Result<()> {
    let mut translator = EventTranslator::new();
    translator.translate("GUILD_CREATE", guild_create(json!([])))?;

    let joined = presence(translator.translate(
        "GUILD_CREATE",
        guild_create(json!([{ "channel_id": "5", "user_id": "77", "session_id": "y" }])),
    )?);

    assert_eq!(joined.previous_channel_id, None);
    assert_eq!(joined.next_channel_id.as_deref(), Some("5"));
    // Member data comes from the guild's member list
    assert_eq!(joined.participant().unwrap().display_name, "Caz");
    Ok(())
}

#[test]
fn test_reseed_keeps_members_still_connected() -> Result<()> {
    let mut translator = EventTranslator::new();
    translator.translate("GUILD_CREATE", guild_create(json!([])))?;
    translator.translate("VOICE_STATE_UPDATE", voice_update("42", Some("1")))?;

    // Still connected, now in another channel: no event, cache follows
    let events = translator.translate(
        "GUILD_CREATE",
        guild_create(json!([{ "channel_id": "2", "user_id": "42", "session_id": "x" }])),
    )?;
    assert!(events.is_empty());

    let left = presence(translator.translate("VOICE_STATE_UPDATE", voice_update("42", None))?);
    assert_eq!(left.previous_channel_id.as_deref(), Some("2"));
    Ok(())
}

#[test]
fn test_unknown_dispatch_is_ignored() -> Result<()> {
    let mut translator = EventTranslator::new();
    assert!(translator.translate("TYPING_START", json!({}))?.is_empty());
    assert!(translator.translate("VOICE_STATE_UPDATE", json!({ "bogus": 1 })).is_err());
    Ok(())
}

#[test]
fn test_member_display_metadata() -> Result<()> {
    let mut translator = EventTranslator::new();
    let mut update = voice_update("42", Some("1"));
    update["member"]["nick"] = json!("Ally");
    update["member"]["avatar"] = json!("a_guildhash");
    update["member"]["user"]["bot"] = json!(true);

    let event = presence(translator.translate("VOICE_STATE_UPDATE", update)?);
    let member = event.participant().unwrap();
    assert_eq!(member.display_name, "Ally");
    assert_eq!(member.kind, AccountKind::Automated);
    assert_eq!(
        member.avatar_url.as_deref(),
        Some("https://cdn.discordapp.com/guilds/900/users/42/avatars/a_guildhash.gif")
    );

    let plain = presence(translator.translate("VOICE_STATE_UPDATE", voice_update("7", Some("1")))?);
    let member = plain.participant().unwrap();
    assert_eq!(member.display_name, "Alice");
    assert_eq!(member.kind, AccountKind::Human);
    assert_eq!(
        member.avatar_url.as_deref(),
        Some("https://cdn.discordapp.com/avatars/7/abc123.png")
    );
    Ok(())
}

#[test]
fn test_default_avatars() -> Result<()> {
    let migrated: User = serde_json::from_value(json!({
        "id": "80351110224678912",
        "username": "nelly",
        "discriminator": "0"
    }))?;
    let index = (80351110224678912u64 >> 22) % 6;
    assert_eq!(
        migrated.avatar_url(),
        format!("https://cdn.discordapp.com/embed/avatars/{}.png", index)
    );

    let legacy: User = serde_json::from_value(json!({
        "id": "1",
        "username": "old",
        "discriminator": "1337"
    }))?;
    assert_eq!(legacy.avatar_url(), "https://cdn.discordapp.com/embed/avatars/2.png");
    assert_eq!(legacy.tag(), "old#1337");
    Ok(())
}

#[test]
fn test_text_based_channel_types() -> Result<()> {
    for (kind, expected) in [(0, true), (2, true), (5, true), (11, true), (4, false), (15, false)] {
        let channel: Channel = serde_json::from_value(json!({ "id": "1", "type": kind }))?;
        assert_eq!(channel.is_text_based(), expected, "channel type {}", kind);
    }
    Ok(())
}

#[test]
fn test_intents_cover_guilds_and_voice_states() {
    assert_eq!(INTENTS, 129);
}

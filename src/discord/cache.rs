use std::collections::{HashMap, HashSet};

use super::models::{Member, VoiceState};
use crate::tracker::{Participant, VoicePresenceEvent};

#[derive(Debug, Clone)]
struct CachedVoiceState {
    channel_id: String,
    member: Option<Participant>,
}

/// Last known voice channel per (guild, user)
///
/// `VOICE_STATE_UPDATE` only carries the new state, so the previous channel
/// has to be remembered here to tell joins, leaves and moves apart.
#[derive(Debug, Default)]
pub struct VoiceStateCache {
    states: HashMap<(String, String), CachedVoiceState>,
    /// Guilds seeded at least once in this process
    known_guilds: HashSet<String>,
}

impl VoiceStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a guild's voice states with the list from `GUILD_CREATE`.
    ///
    /// The first seed of a guild is silent. Later seeds (after a reconnect
    /// missed some updates) return the joins and leaves that happened in the
    /// gap so session bookkeeping can catch up. Moves in the gap only update
    /// the cache.
    pub fn reseed(
        &mut self,
        guild_id: &str,
        states: &[VoiceState],
        members: &[Member],
    ) -> Vec<VoicePresenceEvent> {
        let mut previous: HashMap<String, CachedVoiceState> = HashMap::new();
        self.states.retain(|(g, user_id), state| {
            if g == guild_id {
                previous.insert(user_id.clone(), state.clone());
                false
            } else {
                true
            }
        });

        let mut current: HashMap<String, CachedVoiceState> = HashMap::new();
        for state in states {
            if let Some(channel_id) = &state.channel_id {
                let member = state
                    .member
                    .as_ref()
                    .or_else(|| member_for(members, &state.user_id))
                    .and_then(|m| m.to_participant(Some(guild_id)));
                current.insert(
                    state.user_id.clone(),
                    CachedVoiceState {
                        channel_id: channel_id.clone(),
                        member,
                    },
                );
            }
        }

        let mut events = Vec::new();
        if !self.known_guilds.insert(guild_id.to_string()) {
            for (user_id, before) in &previous {
                if !current.contains_key(user_id) {
                    events.push(VoicePresenceEvent {
                        user_id: user_id.clone(),
                        guild_id: Some(guild_id.to_string()),
                        previous_channel_id: Some(before.channel_id.clone()),
                        next_channel_id: None,
                        member_before: before.member.clone(),
                        member_after: None,
                    });
                }
            }
            for (user_id, after) in &current {
                if !previous.contains_key(user_id) {
                    events.push(VoicePresenceEvent {
                        user_id: user_id.clone(),
                        guild_id: Some(guild_id.to_string()),
                        previous_channel_id: None,
                        next_channel_id: Some(after.channel_id.clone()),
                        member_before: None,
                        member_after: after.member.clone(),
                    });
                }
            }
            events.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        }

        for (user_id, state) in current {
            self.states.insert((guild_id.to_string(), user_id), state);
        }

        events
    }

    /// Apply an update and return the before/after event it represents
    pub fn apply(&mut self, update: VoiceState) -> VoicePresenceEvent {
        let guild_id = update.guild_id.clone().unwrap_or_default();
        let key = (guild_id, update.user_id.clone());

        let member_after = update
            .member
            .as_ref()
            .and_then(|m| m.to_participant(update.guild_id.as_deref()));

        let previous = match &update.channel_id {
            Some(channel_id) => self.states.insert(
                key,
                CachedVoiceState {
                    channel_id: channel_id.clone(),
                    member: member_after.clone(),
                },
            ),
            None => self.states.remove(&key),
        };

        let (previous_channel_id, member_before) = match previous {
            Some(state) => (Some(state.channel_id), state.member),
            None => (None, None),
        };

        VoicePresenceEvent {
            user_id: update.user_id,
            guild_id: update.guild_id,
            previous_channel_id,
            next_channel_id: update.channel_id,
            member_before,
            member_after,
        }
    }

    /// Drop everything known about a guild the bot was removed from
    pub fn forget_guild(&mut self, guild_id: &str) {
        self.states.retain(|(g, _), _| g != guild_id);
        self.known_guilds.remove(guild_id);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

fn member_for<'a>(members: &'a [Member], user_id: &str) -> Option<&'a Member> {
    members
        .iter()
        .find(|m| m.user.as_ref().map(|u| u.id.as_str()) == Some(user_id))
}

//! Session-scoped entity cache with fetch-or-cache hydration.

use std::sync::Arc;

use dashmap::DashMap;

use crate::Result;
use crate::models::{
    Channel, ChannelPayload, DirectMessage, Group, SavedMessages, TextChannel, User, VoiceChannel,
};
use crate::rest;

/// Maps entity IDs to hydrated entities, resolving misses through the REST
/// client. Users and channels live in separate namespaces.
///
/// Concurrent fetches for the same missing ID are NOT deduplicated: each
/// caller may issue its own request and the last write wins. Entries are
/// shared `Arc` handles, so every caller still observes a consistent value
/// and repeated lookups within a session return the same instance. Entries
/// are never evicted by policy; there is no TTL or size bound.
pub struct EntityCache {
    rest: Arc<rest::Client>,
    users: DashMap<String, Arc<User>>,
    channels: DashMap<String, Arc<Channel>>,
}

impl EntityCache {
    #[must_use]
    pub fn new(rest: Arc<rest::Client>) -> Self {
        Self {
            rest,
            users: DashMap::new(),
            channels: DashMap::new(),
        }
    }

    /// Resolve a user by ID: cached entry if present, otherwise fetched from
    /// `GET /users/{id}` and stored.
    ///
    /// # Errors
    ///
    /// Propagates REST errors from the fetch untouched.
    pub async fn user(&self, id: &str) -> Result<Arc<User>> {
        if let Some(user) = self.users.get(id) {
            return Ok(Arc::clone(&user));
        }

        let fetched = Arc::new(self.rest.user(id).await?);
        self.users.insert(id.to_owned(), Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Resolve a channel by ID: cached entry if present, otherwise fetched
    /// from `GET /channels/{id}`, hydrated and stored.
    ///
    /// Hydration resolves the channel's user references through
    /// [`EntityCache::user`], so a miss can issue several requests.
    pub async fn channel(&self, id: &str) -> Result<Arc<Channel>> {
        if let Some(channel) = self.channels.get(id) {
            return Ok(Arc::clone(&channel));
        }

        let payload = self.rest.channel(id).await?;
        self.put_channel(payload).await
    }

    /// Hydrate a wire payload and register it, replacing any previous entry.
    ///
    /// Used for channels pushed over the gateway (`Ready`, `ChannelCreate`),
    /// which must be registered without an explicit fetch.
    pub async fn put_channel(&self, payload: ChannelPayload) -> Result<Arc<Channel>> {
        let channel = Arc::new(self.hydrate(payload).await?);
        self.channels
            .insert(channel.id().to_owned(), Arc::clone(&channel));
        Ok(channel)
    }

    /// Seed a user directly, replacing any previous entry. Used for users
    /// pushed over the gateway.
    pub fn insert_user(&self, user: User) -> Arc<User> {
        let user = Arc::new(user);
        self.users.insert(user.id.clone(), Arc::clone(&user));
        user
    }

    /// Drop a channel entry so the next lookup re-fetches it.
    pub fn evict_channel(&self, id: &str) {
        self.channels.remove(id);
    }

    /// Non-fetching peek at a cached user.
    #[must_use]
    pub fn cached_user(&self, id: &str) -> Option<Arc<User>> {
        self.users.get(id).map(|entry| Arc::clone(&entry))
    }

    /// Non-fetching peek at a cached channel.
    #[must_use]
    pub fn cached_channel(&self, id: &str) -> Option<Arc<Channel>> {
        self.channels.get(id).map(|entry| Arc::clone(&entry))
    }

    /// Number of cached users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of cached channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Resolve a payload's user references and build the hydrated channel.
    ///
    /// A Group's owner is looked up among its own recipients first, so the
    /// owner handle is the same `Arc` instance as the matching recipient.
    async fn hydrate(&self, payload: ChannelPayload) -> Result<Channel> {
        Ok(match payload {
            ChannelPayload::SavedMessages { id, user } => Channel::SavedMessages(SavedMessages {
                id,
                user: self.user(&user).await?,
            }),
            ChannelPayload::DirectMessage {
                id,
                active,
                recipients,
                last_message_id,
            } => {
                let recipients = self.resolve_users(&recipients).await?;
                Channel::DirectMessage(DirectMessage {
                    id,
                    active,
                    recipients,
                    last_message_id,
                })
            }
            ChannelPayload::Group {
                id,
                name,
                recipients,
                owner,
                description,
                last_message_id,
                permissions,
                nsfw,
            } => {
                let recipients = self.resolve_users(&recipients).await?;
                let owner = match recipients.iter().find(|user| user.id == owner) {
                    Some(user) => Arc::clone(user),
                    None => self.user(&owner).await?,
                };
                Channel::Group(Group {
                    id,
                    name,
                    recipients,
                    owner,
                    description,
                    last_message_id,
                    permissions,
                    nsfw,
                })
            }
            ChannelPayload::TextChannel {
                id,
                server,
                name,
                description,
                default_permissions,
                nsfw,
                last_message_id,
            } => Channel::TextChannel(TextChannel {
                id,
                server,
                name,
                description,
                default_permissions,
                nsfw,
                last_message_id,
            }),
            ChannelPayload::VoiceChannel {
                id,
                server,
                name,
                description,
                default_permissions,
                nsfw,
            } => Channel::VoiceChannel(VoiceChannel {
                id,
                server,
                name,
                description,
                default_permissions,
                nsfw,
            }),
        })
    }

    async fn resolve_users(&self, ids: &[String]) -> Result<Vec<Arc<User>>> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            resolved.push(self.user(id).await?);
        }
        Ok(resolved)
    }
}

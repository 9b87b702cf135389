//! Plain-text rendering of cached entities.

use flock_store::{Entity, EntityCache, EntityKind};

/// One-line summary of an entity's counters and state.
pub fn counters(entity: &Entity) -> String {
    let c = &entity.counters;
    let mut line = format!(
        "{} likes{}, {} reposts{}, {} comments",
        c.like_count,
        if c.user_liked { " (liked)" } else { "" },
        c.repost_count,
        if c.has_reposted { " (reposted)" } else { "" },
        c.comment_count,
    );
    if let Some(invitation) = &entity.invitation {
        line.push_str(&format!(", invitation {}", invitation.status.as_str()));
    }
    line
}

/// One line per feed item; reposts and post activities show the post they point at.
pub fn entity_line(entity: &Entity, cache: &EntityCache) -> String {
    let who = entity
        .author
        .as_ref()
        .map(|a| format!("@{}", a.username))
        .unwrap_or_else(|| "?".to_string());

    match &entity.kind {
        EntityKind::Post => {
            let text = entity.text.as_deref().unwrap_or("");
            let reposted = entity
                .original_post
                .as_ref()
                .and_then(|id| cache.get(id))
                .map(|original| format!(" [repost of {}]", original.id))
                .unwrap_or_default();
            format!("{} {}{}: {} | {}", entity.id, who, reposted, text, counters(entity))
        }
        EntityKind::Activity(activity_type) => {
            let subject = entity
                .subject_post
                .as_ref()
                .map(|id| format!(" on {}", id))
                .unwrap_or_default();
            let followed = if entity.actor_followed { " (followed back)" } else { "" };
            format!(
                "{} {} {}{}{}",
                entity.id,
                who,
                activity_type.as_str(),
                subject,
                followed
            )
        }
    }
}

//! Role entity and the priority list that drives nickname prefixes

use crate::value_objects::Snowflake;

/// Role as observed through the platform gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub position: i32,
}

impl Role {
    /// Create a role mirror
    pub fn new(id: Snowflake, guild_id: Snowflake, name: impl Into<String>, position: i32) -> Self {
        Self {
            id,
            guild_id,
            name: name.into(),
            position,
        }
    }
}

/// Ordered role ids, highest priority first
///
/// Static configuration. Of a member's roles, the one with the lowest index
/// in this list decides the nickname prefix; roles absent from the list are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePriorityList {
    ordered: Vec<Snowflake>,
}

impl RolePriorityList {
    /// Build from role ids, highest priority first
    pub fn new(ordered: Vec<Snowflake>) -> Self {
        Self { ordered }
    }

    /// Whether a role participates in prefix selection
    #[inline]
    pub fn contains(&self, role_id: Snowflake) -> bool {
        self.ordered.contains(&role_id)
    }

    /// Select the highest-priority role (lowest index) among `role_ids`
    ///
    /// Returns `None` when no role of the member is tracked by the list.
    pub fn highest_priority(&self, role_ids: &[Snowflake]) -> Option<Snowflake> {
        self.ordered
            .iter()
            .find(|id| role_ids.contains(id))
            .copied()
    }

    /// Number of tracked roles
    #[inline]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the list tracks no roles at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Tracked ids in priority order
    pub fn iter(&self) -> impl Iterator<Item = Snowflake> + '_ {
        self.ordered.iter().copied()
    }
}

impl FromIterator<Snowflake> for RolePriorityList {
    fn from_iter<T: IntoIterator<Item = Snowflake>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

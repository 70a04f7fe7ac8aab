pub struct Icons;

impl Icons {
    pub const ROCKET: &'static str = "🚀";
    pub const CHECK: &'static str = "✅";
    pub const WARN: &'static str = "⚠️";
    pub const INFO: &'static str = "ℹ️";
    pub const STATS: &'static str = "📊";
    pub const LINK: &'static str = "🔗";
    pub const NODE: &'static str = "🔵";
    pub const SCHEMA: &'static str = "📦";
    pub const ARROW: &'static str = "→";
    pub const EMPTY: &'static str = "∅";
}

//! Host-facing runtime settings.

use crate::types::QualityTier;

/// Everything the host can change while the session runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Relay channel; `None` joins the default channel
    pub channel: Option<String>,
    /// Name shown next to the local cursor on peers' screens
    pub name: Option<String>,
    /// Whether local movement is broadcast at all
    pub sharing: bool,
    pub quality: QualityTier,
    /// Drops the relay connection and hides every cursor
    pub disabled: bool,
    /// Draw the local pointer with its label too
    pub show_local_cursor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            channel: None,
            name: None,
            sharing: true,
            quality: QualityTier::High,
            disabled: false,
            show_local_cursor: false,
        }
    }
}

impl Settings {
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_sharing(mut self, sharing: bool) -> Self {
        self.sharing = sharing;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_show_local_cursor(mut self, show: bool) -> Self {
        self.show_local_cursor = show;
        self
    }

    /// Applies one change, returning whether anything actually changed
    pub fn apply(&mut self, update: SettingsUpdate) -> bool {
        match update {
            SettingsUpdate::Channel(channel) => replace(&mut self.channel, channel),
            SettingsUpdate::Name(name) => replace(&mut self.name, name),
            SettingsUpdate::Sharing(sharing) => replace(&mut self.sharing, sharing),
            SettingsUpdate::Quality(quality) => replace(&mut self.quality, quality),
            SettingsUpdate::Disabled(disabled) => replace(&mut self.disabled, disabled),
            SettingsUpdate::ShowLocalCursor(show) => replace(&mut self.show_local_cursor, show),
        }
    }
}

fn replace<V: PartialEq>(slot: &mut V, value: V) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// A single runtime change to the session settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsUpdate {
    Channel(Option<String>),
    Name(Option<String>),
    Sharing(bool),
    Quality(QualityTier),
    Disabled(bool),
    ShowLocalCursor(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert!(settings.sharing);
        assert!(!settings.disabled);
        assert!(!settings.show_local_cursor);
        assert_eq!(settings.quality, QualityTier::High);
        assert!(settings.channel.is_none());
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut settings = Settings::default().with_channel("a");

        assert!(!settings.apply(SettingsUpdate::Channel(Some("a".to_string()))));
        assert!(settings.apply(SettingsUpdate::Channel(Some("b".to_string()))));
        assert_eq!(settings.channel.as_deref(), Some("b"));

        assert!(settings.apply(SettingsUpdate::Quality(QualityTier::Low)));
        assert!(!settings.apply(SettingsUpdate::Quality(QualityTier::Low)));
        assert!(settings.apply(SettingsUpdate::Sharing(false)));
        assert!(!settings.sharing);
    }
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

/// Compositor window category. Affects background-run, suspend and close
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowType {
    #[default]
    Card,
    Popup,
    Minimal,
    Overlay,
    Floating,
    SystemUi,
}

impl WindowType {
    /// Maps a manifest `defaultWindowType`; anything unrecognised is a card.
    pub fn from_description(name: &str) -> Self {
        match name {
            "overlay" => Self::Overlay,
            "popup" => Self::Popup,
            "minimal" => Self::Minimal,
            "floating" => Self::Floating,
            "system_ui" => Self::SystemUi,
            _ => Self::Card,
        }
    }

    /// Compositor-side name, used for the `_WEBOS_WINDOW_TYPE` property.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "_WEBOS_WINDOW_TYPE_CARD",
            Self::Popup => "_WEBOS_WINDOW_TYPE_POPUP",
            Self::Minimal => "_WEBOS_WINDOW_TYPE_RESTRICTED",
            Self::Overlay => "_WEBOS_WINDOW_TYPE_OVERLAY",
            Self::Floating => "_WEBOS_WINDOW_TYPE_FLOATING",
            Self::SystemUi => "_WEBOS_WINDOW_TYPE_SYSTEM_UI",
        }
    }

    pub fn supports_background_run(self) -> bool {
        matches!(self, Self::Floating | Self::Card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("overlay", WindowType::Overlay)]
    #[case("popup", WindowType::Popup)]
    #[case("minimal", WindowType::Minimal)]
    #[case("floating", WindowType::Floating)]
    #[case("system_ui", WindowType::SystemUi)]
    #[case("card", WindowType::Card)]
    #[case("", WindowType::Card)]
    #[case("Overlay", WindowType::Card)]
    fn description_names(#[case] name: &str, #[case] expected: WindowType) {
        assert_eq!(WindowType::from_description(name), expected);
    }

    #[test]
    fn minimal_is_restricted_on_the_compositor() {
        assert_eq!(WindowType::Minimal.as_str(), "_WEBOS_WINDOW_TYPE_RESTRICTED");
    }
}
